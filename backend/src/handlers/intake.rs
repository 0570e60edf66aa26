//! HTTP handlers for green bag intake and main warehouse stock

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{MonthFilter, StockSummary};

use crate::error::AppResult;
use crate::services::intake::{IntakeReceipt, IntakeService, RegisterBagsInput};
use crate::AppState;

/// Register a delivery of green bags
pub async fn register_bags(
    State(state): State<AppState>,
    Json(input): Json<RegisterBagsInput>,
) -> AppResult<(StatusCode, Json<IntakeReceipt>)> {
    let service = IntakeService::new(state.store.clone());
    let receipt = service.register_bags(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Deserialize)]
pub struct MainStockQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

/// Bags at the main warehouse grouped by bean type
pub async fn get_main_stock(
    State(state): State<AppState>,
    Query(query): Query<MainStockQuery>,
) -> AppResult<Json<StockSummary>> {
    let filter = MonthFilter {
        month: query.month.and_then(|m| m.parse().ok()),
        year: query.year.and_then(|y| y.parse().ok()),
    };
    let service = IntakeService::new(state.store.clone());
    Ok(Json(service.main_stock(filter).await?))
}
