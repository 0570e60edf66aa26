//! Read-only catalog and site listings

use std::sync::Arc;

use serde::Serialize;
use shared::{BeanType, Warehouse, WarehouseKind, BEAN_TYPES, REPROCESSED_BEAN_TYPE, ROAST_TYPES, UNSPECIFIED_LABEL};

use crate::error::AppResult;
use crate::store::LedgerStore;

/// Everything the intake and roasting forms offer
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub bean_types: &'static [BeanType],
    pub roast_types: &'static [&'static str],
    pub reprocessed_bean_type: &'static str,
    pub unspecified_label: &'static str,
}

pub fn catalog() -> CatalogView {
    CatalogView {
        bean_types: BEAN_TYPES,
        roast_types: ROAST_TYPES,
        reprocessed_bean_type: REPROCESSED_BEAN_TYPE,
        unspecified_label: UNSPECIFIED_LABEL,
    }
}

#[derive(Clone)]
pub struct WarehouseService {
    store: Arc<dyn LedgerStore>,
}

impl WarehouseService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, kind: Option<WarehouseKind>) -> AppResult<Vec<Warehouse>> {
        self.store.list_warehouses(kind).await
    }
}
