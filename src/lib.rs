pub mod config;
pub mod credential;
pub mod error;
pub mod extract;
pub mod relay;
pub mod server;

pub use config::AppConfig;
pub use credential::{Credential, CredentialProvider, CredentialResolver, ExecutionMode};
pub use error::ServiceError;
pub use relay::{GenerationRelay, OpenAiClient, RelayOptions};
pub use server::build_router;
