use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
}

impl GenerationResult {
    /// Renders the reply under the configured field name.
    pub fn into_body(self, field: ResponseField) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(field.as_str().to_string(), serde_json::Value::String(self.text));
        serde_json::Value::Object(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseField {
    Response,
    GeneratedText,
}

impl ResponseField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseField::Response => "response",
            ResponseField::GeneratedText => "generated_text",
        }
    }
}

impl FromStr for ResponseField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "response" => Ok(ResponseField::Response),
            "generated_text" => Ok(ResponseField::GeneratedText),
            other => Err(format!("unsupported response field: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub model_id: String,
    pub max_tokens: u32,
    pub response_field: ResponseField,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            model_id: "gpt-4o-mini".to_string(),
            max_tokens: 200,
            response_field: ResponseField::Response,
            system_prompt: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}
