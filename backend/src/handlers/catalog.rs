//! HTTP handlers for the catalog and warehouse listings

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{Warehouse, WarehouseKind};

use crate::error::{AppError, AppResult};
use crate::services::catalog::{catalog, CatalogView, WarehouseService};
use crate::AppState;

/// Bean types, roast labels and fixed labels
pub async fn get_catalog() -> Json<CatalogView> {
    Json(catalog())
}

#[derive(Debug, Deserialize)]
pub struct WarehouseQuery {
    pub kind: Option<String>,
}

/// List warehouses, optionally of one kind
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<WarehouseQuery>,
) -> AppResult<Json<Vec<Warehouse>>> {
    let kind = match query.kind.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(WarehouseKind::from_str(raw).ok_or_else(|| AppError::Validation {
            field: "kind".to_string(),
            message: format!("Unknown warehouse kind: {}", raw),
            message_ar: format!("نوع المخزن غير معروف: {}", raw),
        })?),
    };
    let service = WarehouseService::new(state.store.clone());
    Ok(Json(service.list(kind).await?))
}
