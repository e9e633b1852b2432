use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

use super::{health::healthz, payments::create_payments};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(create_payments))
        .route("/healthz", get(healthz))
        .with_state(state)
}
