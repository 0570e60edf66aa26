//! Green bag intake at the main warehouse

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    find_bean_type, intake_codes, validate_intake, BagStatus, LedgerViolation, MonthFilter,
    NewBag, StockSummary, WarehouseKind,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{find_site, BagQuery, ChangeSet, LedgerStore, Mutation};

/// Intake service for registering green bags
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn LedgerStore>,
}

/// Input for registering a delivery of identical bags
#[derive(Debug, Deserialize)]
pub struct RegisterBagsInput {
    pub bean_type: String,
    pub count: i64,
    /// Per-bag weight; the bean type's standard weight when absent
    pub weight_kg: Option<Decimal>,
    pub notes: Option<String>,
}

/// Bags created by one intake
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReceipt {
    pub bean_type: String,
    pub weight_kg: Decimal,
    pub bag_ids: Vec<Uuid>,
    pub bag_codes: Vec<String>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Register `count` bags of one type and weight at the main warehouse
    pub async fn register_bags(&self, input: RegisterBagsInput) -> AppResult<IntakeReceipt> {
        let bean = find_bean_type(&input.bean_type)
            .ok_or_else(|| LedgerViolation::UnknownBeanType(input.bean_type.trim().to_string()))?;
        let weight_kg = input.weight_kg.unwrap_or_else(|| bean.default_weight());
        let count = validate_intake(input.count, weight_kg)?;

        let main = find_site(self.store.as_ref(), WarehouseKind::Main)
            .await?
            .ok_or_else(|| AppError::Validation {
                field: "warehouse_id".to_string(),
                message: "Main warehouse is not configured".to_string(),
                message_ar: "المخزن الرئيسي غير موجود".to_string(),
            })?;

        let notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let bag_codes = intake_codes(bean.code, Utc::now(), count);
        let bags: Vec<NewBag> = bag_codes
            .iter()
            .map(|code| NewBag {
                bag_code: code.clone(),
                bean_type: bean.name.to_string(),
                weight_kg,
                status: BagStatus::InMain,
                warehouse_id: Some(main.id),
                notes: notes.clone(),
            })
            .collect();

        let mut changes = ChangeSet::new();
        changes.push(Mutation::InsertBags(bags));
        let receipt = self.store.apply(changes).await?;

        tracing::info!(
            bean_type = bean.name,
            count = receipt.bag_ids.len(),
            weight_kg = %weight_kg,
            "Registered green bags"
        );

        Ok(IntakeReceipt {
            bean_type: bean.name.to_string(),
            weight_kg,
            bag_ids: receipt.bag_ids,
            bag_codes,
        })
    }

    /// Bags at the main warehouse grouped by bean type
    pub async fn main_stock(&self, filter: MonthFilter) -> AppResult<StockSummary> {
        let mut query = BagQuery::with_status(BagStatus::InMain);
        if let Some(range) = filter.to_range() {
            query = query.created(range);
        }
        let bags = self.store.list_bags(&query).await?;
        Ok(StockSummary::from_bags(&bags))
    }
}
