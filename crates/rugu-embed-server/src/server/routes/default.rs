use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::server::data_models::{HealthResponse, StatusResponse};
use crate::server::state::ServerState;

/// Liveness: answers the same whether or not the model is loaded.
pub async fn root(State(server_state): State<Arc<ServerState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        model: server_state.model.name().to_string(),
        dimensions: server_state.model.dimensions(),
    })
}

/// Readiness: reports whether the model has finished loading.
pub async fn health_check(State(server_state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    tracing::trace!("Health check request received.");

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: server_state.model.is_ready(),
    })
}
