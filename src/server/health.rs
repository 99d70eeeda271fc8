use axum::Json;
use serde::Serialize;
use std::time::SystemTime;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    time: String,
}

/// Always healthy while the process is able to answer, the upstream is not
/// consulted.
pub(crate) async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: humantime::format_rfc3339_millis(SystemTime::now()).to_string(),
    })
}
