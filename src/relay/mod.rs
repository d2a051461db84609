mod generation;
mod openai;
mod types;

pub use generation::GenerationRelay;
pub use openai::{CompletionProvider, OpenAiClient};
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, GenerationResult,
    PromptRequest, RelayOptions, ResponseField,
};
