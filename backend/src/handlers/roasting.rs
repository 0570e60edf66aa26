//! HTTP handlers for roasting batches

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{DateRange, RoastBatch, RoastTotals};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::roasting::{BatchDetail, RecordRoastInput, RoastReceipt, RoastingService};
use crate::AppState;

fn service(state: &AppState) -> RoastingService {
    RoastingService::new(
        state.store.clone(),
        state.config.ledger.high_waste_threshold_kg,
    )
}

/// Record a roasting batch
pub async fn record_roast(
    State(state): State<AppState>,
    Json(input): Json<RecordRoastInput>,
) -> AppResult<(StatusCode, Json<RoastReceipt>)> {
    let receipt = service(&state).record(input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Totals of a roast form without recording it
pub async fn preview_roast(
    State(state): State<AppState>,
    Json(input): Json<RecordRoastInput>,
) -> AppResult<Json<RoastTotals>> {
    Ok(Json(service(&state).preview(&input)?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Roasting history, newest first
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<RoastBatch>>> {
    let range = DateRange::new(
        query.from.and_then(|s| s.parse().ok()),
        query.to.and_then(|s| s.parse().ok()),
    );
    Ok(Json(service(&state).history(range).await?))
}

/// One batch with its lines and waste
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchDetail>> {
    Ok(Json(service(&state).detail(batch_id).await?))
}
