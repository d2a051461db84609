use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    credential::CredentialProvider,
    error::ServiceError,
    extract::ValidatedJson,
    relay::{GenerationRelay, PromptRequest},
};

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialProvider>,
    pub relay: Arc<GenerationRelay>,
}

pub fn build_router(
    credentials: Arc<dyn CredentialProvider>,
    relay: Arc<GenerationRelay>,
) -> Router {
    let state = AppState { credentials, relay };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/generate", post(generate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the GenAI API" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn generate(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PromptRequest>,
) -> Result<Json<Value>, ServiceError> {
    let credential = state.credentials.resolve().await?;
    let result = state.relay.generate(&request.prompt, &credential).await?;
    info!(bytes = result.text.len(), "generation relayed");

    Ok(Json(result.into_body(state.relay.options().response_field)))
}
