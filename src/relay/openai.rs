use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    credential::Credential,
    error::ServiceError,
    relay::types::{ChatCompletionRequest, ChatCompletionResponse},
};

/// External chat-completion endpoint.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ServiceError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ServiceError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model = %request.model, "calling completion endpoint");

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::GenerationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|envelope| envelope.error.message)
                .unwrap_or(raw);
            warn!(%status, "provider rejected request");
            return Err(ServiceError::GenerationFailed(format!(
                "provider returned {status}: {message}"
            )));
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ServiceError::GenerationFailed(format!("invalid provider response: {e}")))
    }
}
