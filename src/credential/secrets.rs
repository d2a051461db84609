use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, timeout::TimeoutConfig};
use aws_sdk_secretsmanager::{
    config::{Credentials, Region, retry::RetryConfig},
    error::DisplayErrorContext,
};
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Remote key-value store holding structured secret payloads by name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the string payload stored under `name`.
    async fn secret_string(&self, name: &str) -> Result<String, ServiceError>;
}

pub struct AwsSecretsManager {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretsManager {
    pub async fn connect(region: &str, timeout: Duration) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            )
            .load()
            .await;
        debug!(%region, "secrets manager client configured");

        Self {
            client: aws_sdk_secretsmanager::Client::new(&shared),
        }
    }

    /// Client for an explicit endpoint with static credentials, e.g. a local
    /// Secrets Manager emulator. Retries are disabled.
    pub fn with_endpoint(
        region: &str,
        endpoint_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Self {
        let conf = aws_sdk_secretsmanager::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint_url)
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            )
            .build();
        debug!(%region, %endpoint_url, "secrets manager client configured");

        Self {
            client: aws_sdk_secretsmanager::Client::from_conf(conf),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManager {
    async fn secret_string(&self, name: &str) -> Result<String, ServiceError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| {
                warn!(secret = %name, error = %DisplayErrorContext(&err), "secret lookup failed");
                ServiceError::CredentialUnavailable(
                    "failed to retrieve API key from Secrets Manager".into(),
                )
            })?;

        output.secret_string().map(str::to_string).ok_or_else(|| {
            ServiceError::CredentialUnavailable(format!(
                "secret {name} is stored in binary format, which is not supported"
            ))
        })
    }
}

/// Extracts `field` from a JSON object payload.
pub fn field_from_payload(payload: &str, field: &str) -> Result<String, ServiceError> {
    let parsed: serde_json::Value = serde_json::from_str(payload).map_err(|err| {
        ServiceError::CredentialUnavailable(format!("secret payload is not valid JSON: {err}"))
    })?;

    match parsed.get(field) {
        Some(serde_json::Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ServiceError::CredentialUnavailable(format!(
            "secret field {field} is not a string"
        ))),
        None => Err(ServiceError::CredentialUnavailable(format!(
            "secret has no field {field}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method},
    };

    use super::*;

    const AMZ_JSON: &str = "application/x-amz-json-1.1";

    fn store_at(endpoint_url: &str) -> AwsSecretsManager {
        AwsSecretsManager::with_endpoint(
            "eu-central-1",
            endpoint_url,
            Credentials::new("AKIDTEST", "secret", None, None, "static"),
            Duration::from_secs(5),
        )
    }

    async fn mount_reply(server: &MockServer, status: u16, body: serde_json::Value) {
        let mut template = ResponseTemplate::new(status)
            .set_body_raw(body.to_string().into_bytes(), AMZ_JSON);
        if let Some(kind) = body.get("__type").and_then(|v| v.as_str()) {
            template = template.insert_header("x-amzn-errortype", kind);
        }
        Mock::given(method("POST"))
            .and(header("x-amz-target", "secretsmanager.GetSecretValue"))
            .and(body_partial_json(json!({ "SecretId": "openai/api_key" })))
            .respond_with(template)
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn secret_string_is_returned_as_is() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            200,
            json!({
                "ARN": "arn:aws:secretsmanager:eu-central-1:123456789012:secret:openai/api_key",
                "Name": "openai/api_key",
                "SecretString": "{\"OPENAI_API_KEY\":\"sk-managed\"}"
            }),
        )
        .await;

        let payload = store_at(&server.uri())
            .secret_string("openai/api_key")
            .await
            .unwrap();
        assert_eq!(payload, r#"{"OPENAI_API_KEY":"sk-managed"}"#);
    }

    #[tokio::test]
    async fn binary_secret_is_unavailable() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            200,
            json!({
                "ARN": "arn:aws:secretsmanager:eu-central-1:123456789012:secret:openai/api_key",
                "Name": "openai/api_key",
                "SecretBinary": "c2stYmluYXJ5"
            }),
        )
        .await;

        let err = store_at(&server.uri())
            .secret_string("openai/api_key")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CredentialUnavailable(_)));
        assert!(err.to_string().contains("binary"));
    }

    #[tokio::test]
    async fn missing_secret_is_unavailable() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            400,
            json!({
                "__type": "ResourceNotFoundException",
                "message": "Secrets Manager can't find the specified secret."
            }),
        )
        .await;

        let err = store_at(&server.uri())
            .secret_string("openai/api_key")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CredentialUnavailable(_)));
        assert!(err.to_string().contains("Secrets Manager"));
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let err = store_at("http://127.0.0.1:1")
            .secret_string("openai/api_key")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CredentialUnavailable(_)));
    }

    #[test]
    fn extracts_named_field() {
        let value = field_from_payload(r#"{"OPENAI_API_KEY":"sk-abc","other":1}"#, "OPENAI_API_KEY")
            .unwrap();
        assert_eq!(value, "sk-abc");
    }

    #[test]
    fn rejects_non_json_payload() {
        let err = field_from_payload("sk-abc", "OPENAI_API_KEY").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn rejects_missing_or_mistyped_field() {
        assert!(field_from_payload(r#"{"KEY":"x"}"#, "OPENAI_API_KEY").is_err());
        assert!(field_from_payload(r#"{"OPENAI_API_KEY":42}"#, "OPENAI_API_KEY").is_err());
        assert!(field_from_payload(r#"["OPENAI_API_KEY"]"#, "OPENAI_API_KEY").is_err());
    }
}
