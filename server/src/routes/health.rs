//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use brain_classifier::backend::backend_name;
use brain_classifier::SlotStatus;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct ModelHealth {
    pub test_type: String,
    #[serde(flatten)]
    pub status: SlotStatus,
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// "ok" when every model loaded, "degraded" otherwise
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub backend: String,
    pub models: Vec<ModelHealth>,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    let models: Vec<ModelHealth> = state
        .registry
        .status()
        .into_iter()
        .map(|(test_type, status)| ModelHealth {
            test_type: test_type.label().to_string(),
            status,
        })
        .collect();

    let status = if models.iter().all(|m| m.status.is_loaded()) {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: brain_classifier::VERSION.to_string(),
        backend: backend_name().to_string(),
        models,
    })
}
