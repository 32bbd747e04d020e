use crate::api::APIResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod keywords;
pub mod model;
pub mod normalize;
pub mod standards;
pub mod upload;

#[cfg(test)]
mod testing;

/// Shown instead of a preview when a PDF has no extractable text.
pub const NO_TEXT_EXTRACTED: &str = "no text extracted";

pub fn server_error(body: APIResponse) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

pub fn bad_request(body: APIResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub fn good_response(body: APIResponse) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
