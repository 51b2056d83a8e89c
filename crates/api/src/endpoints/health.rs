//! Liveness endpoint.

use axum::Json;
use serde_json::{Value, json};

/// Report that the process is serving requests.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
