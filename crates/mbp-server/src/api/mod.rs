//! HTTP surface: router construction and serving

pub mod response;

use axum::{http::HeaderValue, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::features;
use crate::store::PgDatasetStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: PgDatasetStore,
}

/// Bind and serve the API until shutdown.
pub async fn serve(config: Config, store: PgDatasetStore) -> anyhow::Result<()> {
    let state = AppState { store };
    let app = create_router(state, &config)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn create_router(state: AppState, config: &Config) -> anyhow::Result<Router> {
    let origins = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new().allow_origin(AllowOrigin::list(origins));

    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1/datasets", features::datasets::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "MBP Server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
