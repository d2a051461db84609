use std::sync::Arc;

use tracing::debug;

use crate::{
    credential::Credential,
    error::ServiceError,
    relay::{
        CompletionProvider,
        types::{ChatCompletionRequest, ChatMessage, GenerationResult, RelayOptions},
    },
};

pub struct GenerationRelay {
    provider: Arc<dyn CompletionProvider>,
    options: RelayOptions,
}

impl GenerationRelay {
    pub fn new(provider: Arc<dyn CompletionProvider>, options: RelayOptions) -> Self {
        Self { provider, options }
    }

    pub fn options(&self) -> &RelayOptions {
        &self.options
    }

    pub fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.options.system_prompt.as_ref() {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        ChatCompletionRequest {
            model: self.options.model_id.clone(),
            messages,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        }
    }

    /// Returns the first choice's text exactly as the provider sent it.
    pub async fn generate(
        &self,
        prompt: &str,
        credential: &Credential,
    ) -> Result<GenerationResult, ServiceError> {
        let request = self.build_request(prompt);
        let response = self.provider.complete(credential, &request).await?;
        debug!(choices = response.choices.len(), "provider responded");

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ServiceError::GenerationFailed("provider returned no choices".into())
        })?;
        let text = choice.message.content.ok_or_else(|| {
            ServiceError::GenerationFailed("provider returned an empty message".into())
        })?;

        Ok(GenerationResult { text })
    }
}
