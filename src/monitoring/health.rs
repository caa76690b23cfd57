use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::info;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Serve the health endpoint until the process exits.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Health endpoint listening on port {}", port);
    axum::serve(listener, router()).await?;
    Ok(())
}
