mod resolver;
mod secrets;
mod types;

pub use resolver::{CredentialProvider, CredentialResolver, CredentialSource};
pub use secrets::{AwsSecretsManager, SecretStore, field_from_payload};
pub use types::{Credential, CredentialCache, ExecutionMode};
