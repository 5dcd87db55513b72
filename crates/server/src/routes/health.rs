use axum::Json;
use serde_json::{json, Value};

/// Liveness check. Does not touch the index or the providers.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
