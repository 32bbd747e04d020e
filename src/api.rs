use crate::model::AnalysisResult;
use serde::Serialize;

#[derive(Debug, Serialize, Default)]
pub struct APIResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub standards: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
}

impl APIResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        APIResponse {
            status: msg.to_owned(),
            ..Default::default()
        }
    }

    pub fn new_error(msg: &str, error: String) -> Self {
        APIResponse {
            status: msg.to_owned(),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn new_standards(standards: Vec<String>) -> Self {
        APIResponse {
            status: "got standards".to_owned(),
            standards,
            ..Default::default()
        }
    }

    pub fn new_result(result: AnalysisResult) -> Self {
        APIResponse {
            status: "analyzed".to_owned(),
            result: Some(result),
            ..Default::default()
        }
    }
}
