use axum::{extract::State, Json};
use serde::Deserialize;
use std::{borrow::Cow, time::Instant};
use validator::{Validate, ValidationError};

use crate::{
    api::{error::ApiError, response::ApiResponse},
    settlement::{validate_total_spent, Settlement},
    state::AppState,
};

/// Per-person spend, index-aligned with the caller's list of people.
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentsRequest {
    #[validate(custom(function = "validate_spend_amounts"))]
    pub total_spent: Vec<f64>,
}

fn validate_spend_amounts(total_spent: &[f64]) -> Result<(), ValidationError> {
    validate_total_spent(total_spent).map_err(|e| {
        let mut err = ValidationError::new("invalid_spend");
        err.message = Some(Cow::Owned(e.to_string()));
        err
    })
}

/// POST /api/v1/payments - Compute the transfers that settle a trip
pub async fn create_payments(
    State(state): State<AppState>,
    Json(request): Json<PaymentsRequest>,
) -> Result<Json<ApiResponse<Settlement>>, ApiError> {
    request.validate()?;
    tracing::debug!(people = request.total_spent.len(), "settlement requested");

    let started = Instant::now();
    let settlement = state.optimizer.settle(&request.total_spent).await?;
    let count = settlement.payments.len();

    Ok(Json(
        ApiResponse::success(settlement)
            .with_count(count)
            .with_duration(started.elapsed().as_millis() as u64),
    ))
}
