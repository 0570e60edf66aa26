//! Reporting handlers for branch stock and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::reporting::{BranchStockFilter, ReportingService};
use crate::AppState;

#[derive(Deserialize)]
pub struct BranchStockQuery {
    pub branch_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

/// Get branch stock report
pub async fn get_branch_stock_report(
    State(state): State<AppState>,
    Query(query): Query<BranchStockQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.store.clone());

    let filter = BranchStockFilter {
        branch_id: query.branch_id.and_then(|s| s.parse().ok()),
        from: query.from.and_then(|s| s.parse().ok()),
        to: query.to.and_then(|s| s.parse().ok()),
    };

    let report = service.branch_stock(&filter).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&ReportingService::export_rows(&report))?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8"), (header::CONTENT_DISPOSITION, "attachment; filename=\"branch_stock.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(report).into_response())
    }
}
