//! Health Check Handler

use axum::Json;
use serde_json::json;

/// GET /health (ungated)
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "mediamill",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
