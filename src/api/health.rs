use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether the LP engine finished its one-time initialization
    pub solver_ready: bool,
}

/// GET /api/v1/healthz
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        solver_ready: state.optimizer.solver().is_ready(),
    })
}
