use axum::{extract::State, routing::get, Json, Router};
use chrono::Local;
use serde_json::{json, Value};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

fn timestamp() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.info.name,
        "version": state.info.version,
        "status": "running",
        "environment": state.info.environment,
        "timestamp": timestamp(),
    }))
}

/// Always 200; the body says whether the database answered.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.repo.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!(error = %e, "Health check database probe failed");
            "unhealthy"
        }
    };

    Json(json!({
        "status": database,
        "database": database,
        "timestamp": timestamp(),
    }))
}
