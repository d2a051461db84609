use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genai_relay_service::{
    AppConfig, CredentialResolver, ExecutionMode, GenerationRelay, OpenAiClient, build_router,
    config::MANAGED_MARKER_VAR, credential::CredentialSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local runs keep the key in .env; a missing file is fine.
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let mode = ExecutionMode::detect(MANAGED_MARKER_VAR);
    tracing::info!(?mode, model = %config.relay.model_id, "starting GenAI relay");

    let source = CredentialSource::for_mode(mode, &config).await;
    let credentials = Arc::new(CredentialResolver::new(source, config.credential_cache));

    let provider = OpenAiClient::new(config.api_base_url.clone(), config.request_timeout)?;
    let relay = Arc::new(GenerationRelay::new(
        Arc::new(provider),
        config.relay.clone(),
    ));

    let router = build_router(credentials, relay);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "REST server ready");

    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hyper=warn,axum::rejection=trace".into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
