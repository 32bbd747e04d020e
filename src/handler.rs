use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::Method,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::analysis::Analyzer;
use crate::api::APIResponse;
use crate::error::AnalysisError;
use crate::upload::{AnalysisOutcome, UploadForm, UploadStore};
use crate::{bad_request, good_response, server_error, unpack_error};

const STANDARD_FIELD: &str = "standard";
const FILE_FIELD: &str = "bank_pdf";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub uploads: Arc<UploadStore>,
    pub timeout: Duration,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(show_form))
        .route("/healthcheck", get(healthcheck))
        .route("/standards", get(list_standards))
        .route("/analyze", post(analyze))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::new_from_msg("ok"))
}

pub async fn list_standards(State(state): State<AppState>) -> Response {
    let standards = state.analyzer.list_selectable_standards().to_vec();
    good_response(APIResponse::new_standards(standards))
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, axum::extract::multipart::MultipartError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            STANDARD_FIELD => form.standard = Some(field.text().await?),
            FILE_FIELD => {
                form.filename = field.file_name().map(str::to_string);
                form.data = field.bytes().await?.to_vec();
            }
            other => tracing::debug!(field = other, "ignoring form field"),
        }
    }

    Ok(form)
}

pub async fn analyze(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let form = match read_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, status = %e.status(), "failed to read multipart body");
            return (e.status(), Json(APIResponse::new_error("invalid request", e.body_text()))).into_response();
        }
    };

    let upload = match form.validate() {
        Ok(upload) => upload,
        Err(e) => {
            tracing::info!(error = %e, "rejected upload");
            return bad_request(APIResponse::new_error("invalid request", e.to_string()));
        }
    };

    let stored = match state.uploads.persist(&upload).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!(error = %e, "failed to store upload");
            return server_error(APIResponse::new_error(
                "failed to store upload",
                unpack_error(&AnalysisError::Storage(e)),
            ));
        }
    };

    let analyzer = state.analyzer.clone();
    let standard = upload.standard.clone();
    let target = stored.clone();
    let task = tokio::task::spawn_blocking(move || analyzer.analyze(&standard, &target.filename, &target.path));

    let outcome = match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(AnalysisError::Task(e.to_string())),
        Err(_) => Err(AnalysisError::Timeout(state.timeout.as_secs())),
    };

    match outcome {
        Ok(result) => {
            state.uploads.finish(&stored, AnalysisOutcome::Succeeded);
            tracing::info!(filename = %result.filename, standard = %result.standard, "analysis complete");
            good_response(APIResponse::new_result(result))
        }
        Err(e) => {
            state.uploads.finish(&stored, AnalysisOutcome::Failed);
            if e.is_validation() {
                return bad_request(APIResponse::new_error("invalid request", e.to_string()));
            }
            tracing::error!(error = %unpack_error(&e), filename = %stored.filename, "analysis failed");
            server_error(APIResponse::new_error("failed to analyze document", unpack_error(&e)))
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub async fn show_form(State(state): State<AppState>) -> Html<String> {
    let options: String = state
        .analyzer
        .list_selectable_standards()
        .iter()
        .map(|name| {
            let name = escape_html(name);
            format!("<option value=\"{name}\">{name}</option>")
        })
        .collect();

    Html(format!(
        r#"
        <!doctype html>
        <html>
            <head><title>esglens</title></head>
            <body>
                <form action="/analyze" method="post" enctype="multipart/form-data">
                    <label>
                        Standard:
                        <select name="{STANDARD_FIELD}">
                            <option value="">-- select --</option>
                            {options}
                        </select>
                    </label>
                    <label>
                        Bank ESG report (PDF):
                        <input type="file" name="{FILE_FIELD}" accept=".pdf">
                    </label>

                    <input type="submit" value="Analyze">
                </form>
            </body>
        </html>
        "#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("S&P <ESG> \"A\""), "S&amp;P &lt;ESG&gt; &quot;A&quot;");
    }
}
