use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;

use crate::error::AppResult;
use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/cache", get(health_check_cache))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": true }))
}

async fn health_check_cache(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<serde_json::Value>> {
    let backend = state.store.ping().await?;
    Ok(Json(json!({ "status": true, "backend": backend })))
}
