use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("API key not found: {0}")]
    CredentialUnavailable(String),
    #[error("Error generating text: {0}")]
    GenerationFailed(String),
    #[error("request validation failed")]
    Validation(Vec<ValidationIssue>),
}

/// One entry of a 422 body, shaped like `{"type", "loc", "msg"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<String>,
    pub msg: String,
}

impl ValidationIssue {
    pub fn new(kind: &'static str, loc: &[&str], msg: impl Into<String>) -> Self {
        Self {
            kind,
            loc: loc.iter().map(|part| part.to_string()).collect(),
            msg: msg.into(),
        }
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::CredentialUnavailable(_) | ServiceError::GenerationFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ServiceError::Validation(issues) => serde_json::json!({ "detail": issues }),
            other => {
                tracing::error!(error = %other, "request failed");
                serde_json::json!({ "detail": other.to_string() })
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
