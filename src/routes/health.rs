use axum::Json;
use serde_json::{json, Value};

/// Liveness check
///
/// Deployed clients ping this exact body to confirm the API is up, so the
/// shape is part of the contract.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "test": "working!" }))
}
