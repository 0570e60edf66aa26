//! HTTP handlers for moving bags to the roastery

use axum::{extract::State, Json};
use shared::StockSummary;

use crate::error::AppResult;
use crate::services::transfer::{TransferReceipt, TransferService, TransferToRoasteryInput};
use crate::AppState;

/// Move the oldest bags of a type to the roastery
pub async fn transfer_to_roastery(
    State(state): State<AppState>,
    Json(input): Json<TransferToRoasteryInput>,
) -> AppResult<Json<TransferReceipt>> {
    let service = TransferService::new(state.store.clone());
    Ok(Json(service.move_to_roastery(input).await?))
}

/// Bags at the roastery grouped by bean type
pub async fn get_roastery_stock(State(state): State<AppState>) -> AppResult<Json<StockSummary>> {
    let service = TransferService::new(state.store.clone());
    Ok(Json(service.roastery_stock().await?))
}
