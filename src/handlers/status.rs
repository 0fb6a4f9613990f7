use axum::{response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Liveness endpoint for callers and monitoring.
pub async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "Fake News Detection API",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
