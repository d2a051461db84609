use std::{env, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    credential::{
        Credential, CredentialCache, ExecutionMode,
        secrets::{AwsSecretsManager, SecretStore, field_from_payload},
    },
    error::ServiceError,
};

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self) -> Result<Credential, ServiceError>;
}

pub enum CredentialSource {
    Environment {
        var: String,
    },
    SecretStore {
        store: Arc<dyn SecretStore>,
        secret_name: String,
        field: String,
    },
}

impl CredentialSource {
    pub fn local(config: &AppConfig) -> Self {
        CredentialSource::Environment {
            var: config.api_key_env.clone(),
        }
    }

    pub fn managed(store: Arc<dyn SecretStore>, config: &AppConfig) -> Self {
        CredentialSource::SecretStore {
            store,
            secret_name: config.secret_name.clone(),
            field: config.secret_field.clone(),
        }
    }

    /// Only the managed path touches the network to build its client.
    pub async fn for_mode(mode: ExecutionMode, config: &AppConfig) -> Self {
        match mode {
            ExecutionMode::Local => Self::local(config),
            ExecutionMode::Managed => {
                let store =
                    AwsSecretsManager::connect(&config.secret_region, config.request_timeout)
                        .await;
                Self::managed(Arc::new(store), config)
            }
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        match self {
            CredentialSource::Environment { .. } => ExecutionMode::Local,
            CredentialSource::SecretStore { .. } => ExecutionMode::Managed,
        }
    }

    async fn fetch(&self) -> Result<Credential, ServiceError> {
        match self {
            CredentialSource::Environment { var } => {
                let value = env::var(var).map_err(|_| {
                    ServiceError::CredentialUnavailable(format!(
                        "{var} not found in environment variables"
                    ))
                })?;
                Credential::new(value)
            }
            CredentialSource::SecretStore {
                store,
                secret_name,
                field,
            } => {
                let payload = store.secret_string(secret_name).await?;
                Credential::new(field_from_payload(&payload, field)?)
            }
        }
    }
}

pub struct CredentialResolver {
    source: CredentialSource,
    cache: CredentialCache,
    cached: RwLock<Option<Credential>>,
}

impl CredentialResolver {
    pub fn new(source: CredentialSource, cache: CredentialCache) -> Self {
        info!(mode = ?source.mode(), ?cache, "credential resolver ready");
        Self {
            source,
            cache,
            cached: RwLock::new(None),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.source.mode()
    }
}

#[async_trait]
impl CredentialProvider for CredentialResolver {
    async fn resolve(&self) -> Result<Credential, ServiceError> {
        if self.cache == CredentialCache::Process {
            let cached = self.cached.read().clone();
            if let Some(credential) = cached {
                return Ok(credential);
            }
        }

        // Failures are not cached; the next request tries again.
        let credential = self.source.fetch().await?;
        debug!(mode = ?self.mode(), "credential resolved");

        if self.cache == CredentialCache::Process {
            self.cached.write().replace(credential.clone());
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serial_test::serial;

    use super::*;

    struct CountingStore {
        payload: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(payload: Result<&'static str, &'static str>) -> Arc<Self> {
            Arc::new(Self {
                payload,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SecretStore for CountingStore {
        async fn secret_string(&self, _name: &str) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload
                .map(str::to_string)
                .map_err(|msg| ServiceError::CredentialUnavailable(msg.into()))
        }
    }

    fn config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "API_KEY_ENV" => Some("GENAI_RELAY_RESOLVER_TEST_KEY".into()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn managed_path_reads_field_from_store() {
        let store = CountingStore::new(Ok(r#"{"OPENAI_API_KEY":"sk-managed"}"#));
        let resolver = CredentialResolver::new(
            CredentialSource::managed(store.clone(), &config()),
            CredentialCache::Request,
        );

        assert_eq!(resolver.mode(), ExecutionMode::Managed);
        assert_eq!(resolver.resolve().await.unwrap().expose(), "sk-managed");
    }

    #[tokio::test]
    async fn process_cache_fetches_once() {
        let store = CountingStore::new(Ok(r#"{"OPENAI_API_KEY":"sk-managed"}"#));
        let resolver = CredentialResolver::new(
            CredentialSource::managed(store.clone(), &config()),
            CredentialCache::Process,
        );

        for _ in 0..3 {
            resolver.resolve().await.unwrap();
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn request_cache_fetches_every_time() {
        let store = CountingStore::new(Ok(r#"{"OPENAI_API_KEY":"sk-managed"}"#));
        let resolver = CredentialResolver::new(
            CredentialSource::managed(store.clone(), &config()),
            CredentialCache::Request,
        );

        for _ in 0..3 {
            resolver.resolve().await.unwrap();
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn store_failures_are_not_cached() {
        let store = CountingStore::new(Err("unreachable"));
        let resolver = CredentialResolver::new(
            CredentialSource::managed(store.clone(), &config()),
            CredentialCache::Process,
        );

        assert!(matches!(
            resolver.resolve().await,
            Err(ServiceError::CredentialUnavailable(_))
        ));
        assert!(resolver.resolve().await.is_err());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_secret_field_is_unavailable() {
        let store = CountingStore::new(Ok(r#"{"OPENAI_API_KEY":""}"#));
        let resolver = CredentialResolver::new(
            CredentialSource::managed(store, &config()),
            CredentialCache::Process,
        );
        assert!(resolver.resolve().await.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn local_path_reads_environment() {
        let resolver =
            CredentialResolver::new(CredentialSource::local(&config()), CredentialCache::Request);
        assert_eq!(resolver.mode(), ExecutionMode::Local);

        unsafe { env::remove_var("GENAI_RELAY_RESOLVER_TEST_KEY") };
        let err = resolver.resolve().await.unwrap_err();
        assert!(err.to_string().contains("GENAI_RELAY_RESOLVER_TEST_KEY"));

        unsafe { env::set_var("GENAI_RELAY_RESOLVER_TEST_KEY", "sk-local") };
        assert_eq!(resolver.resolve().await.unwrap().expose(), "sk-local");
        unsafe { env::remove_var("GENAI_RELAY_RESOLVER_TEST_KEY") };
    }

    #[tokio::test]
    async fn local_mode_builds_environment_source() {
        let source = CredentialSource::for_mode(ExecutionMode::Local, &config()).await;
        assert_eq!(source.mode(), ExecutionMode::Local);
    }
}
