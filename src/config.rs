use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

use crate::credential::CredentialCache;
use crate::relay::{RelayOptions, ResponseField};

/// Set by the serverless host; its presence selects the secrets-store path.
pub const MANAGED_MARKER_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub api_key_env: String,
    pub secret_name: String,
    pub secret_region: String,
    pub secret_field: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub credential_cache: CredentialCache,
    pub relay: RelayOptions,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults
    /// for absent or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8000".into())
            .parse()
            .unwrap_or_else(|_| SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000));

        let api_key_env = lookup("API_KEY_ENV").unwrap_or_else(|| "OPENAI_API_KEY".to_string());
        let secret_name = lookup("SECRET_NAME").unwrap_or_else(|| "openai/api_key".to_string());
        let secret_region = lookup("SECRET_REGION").unwrap_or_else(|| "eu-central-1".to_string());
        let secret_field = lookup("SECRET_FIELD").unwrap_or_else(|| "OPENAI_API_KEY".to_string());

        let api_base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        if api_base_url.is_empty() {
            anyhow::bail!("OPENAI_BASE_URL must not be empty");
        }

        let request_timeout = parsed(&lookup, "REQUEST_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));
        let credential_cache = parsed(&lookup, "CREDENTIAL_CACHE").unwrap_or_default();

        let defaults = RelayOptions::default();
        let relay = RelayOptions {
            model_id: lookup("MODEL_ID").unwrap_or(defaults.model_id),
            max_tokens: parsed(&lookup, "MAX_TOKENS").unwrap_or(defaults.max_tokens),
            response_field: parsed::<ResponseField, _>(&lookup, "RESPONSE_FIELD")
                .unwrap_or(defaults.response_field),
            system_prompt: lookup("SYSTEM_PROMPT").filter(|s| !s.trim().is_empty()),
            temperature: parsed(&lookup, "TEMPERATURE").filter(|t: &f32| t.is_finite()),
        };

        Ok(Self {
            listen_addr,
            api_key_env,
            secret_name,
            secret_region,
            secret_field,
            api_base_url,
            request_timeout,
            credential_cache,
            relay,
        })
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
