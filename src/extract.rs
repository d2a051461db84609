use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::{ServiceError, ValidationIssue};

/// JSON body extractor that rejects with a structured 422 instead of
/// axum's plain-text rejection.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            ServiceError::Validation(vec![ValidationIssue::new(
                "body_unreadable",
                &["body"],
                rejection.body_text(),
            )])
        })?;

        parse_body(&bytes).map(ValidatedJson)
    }
}

pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ServiceError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|_| {
        ServiceError::Validation(vec![ValidationIssue::new(
            "json_invalid",
            &["body"],
            "JSON decode error",
        )])
    })?;

    // Derived struct impls also accept sequences; only objects carry fields.
    if !value.is_object() {
        return Err(ServiceError::Validation(vec![ValidationIssue::new(
            "model_attributes_type",
            &["body"],
            "Input should be a valid dictionary or object to extract fields from",
        )]));
    }

    serde_path_to_error::deserialize(value)
        .map_err(|err| ServiceError::Validation(vec![issue_from(err)]))
}

fn issue_from(err: serde_path_to_error::Error<serde_json::Error>) -> ValidationIssue {
    let path = err.path().to_string();
    let inner = err.into_inner();

    if inner.classify() != Category::Data {
        return ValidationIssue::new("json_invalid", &["body"], "JSON decode error");
    }

    let mut loc = vec!["body".to_string()];
    if path != "." {
        loc.extend(path.split('.').map(str::to_string));
    }

    let message = inner.to_string();
    match missing_field(&message) {
        Some(field) => {
            loc.push(field.to_string());
            ValidationIssue {
                kind: "missing",
                loc,
                msg: "Field required".to_string(),
            }
        }
        None => ValidationIssue {
            kind: "type_error",
            loc,
            msg: message,
        },
    }
}

fn missing_field(message: &str) -> Option<&str> {
    let rest = message.split_once("missing field `")?.1;
    rest.split_once('`').map(|(field, _)| field)
}
