//! HTTP handlers for branch dispatch

use axum::{extract::State, http::StatusCode, Json};
use shared::OutputAllocation;

use crate::error::AppResult;
use crate::services::dispatch::{DispatchInput, DispatchReceipt, DispatchService};
use crate::AppState;

fn service(state: &AppState) -> DispatchService {
    DispatchService::new(state.store.clone(), state.config.ledger.allocation_options())
}

/// Output lines that still have roasted coffee to send
pub async fn list_available(State(state): State<AppState>) -> AppResult<Json<Vec<OutputAllocation>>> {
    Ok(Json(service(&state).available().await?))
}

/// Send part of an output line to a branch
pub async fn dispatch_to_branch(
    State(state): State<AppState>,
    Json(input): Json<DispatchInput>,
) -> AppResult<(StatusCode, Json<DispatchReceipt>)> {
    let receipt = service(&state).dispatch(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
