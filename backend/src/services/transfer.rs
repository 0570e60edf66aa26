//! Moving green bags from the main warehouse to the roastery

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{validate_transfer_count, BagStatus, FifoPool, LedgerViolation, StockSummary};
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::{BagQuery, ChangeSet, LedgerStore, Mutation};

#[derive(Clone)]
pub struct TransferService {
    store: Arc<dyn LedgerStore>,
}

#[derive(Debug, Deserialize)]
pub struct TransferToRoasteryInput {
    pub bean_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub bean_type: String,
    /// Moved bags, oldest first
    pub bag_ids: Vec<Uuid>,
}

impl TransferService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Move the `count` oldest bags of a type to the roastery, all or none
    pub async fn move_to_roastery(&self, input: TransferToRoasteryInput) -> AppResult<TransferReceipt> {
        let bean_type = input.bean_type.trim().to_string();
        if bean_type.is_empty() {
            return Err(LedgerViolation::MissingField {
                field: "bean_type",
                line: None,
            }
            .into());
        }

        let bags = self
            .store
            .list_bags(&BagQuery::with_status(BagStatus::InMain).bean_type(bean_type.as_str()))
            .await?;
        let pool = FifoPool::from_bags(&bags);

        let count = validate_transfer_count(&bean_type, input.count, pool.len()).map_err(|e| {
            tracing::warn!(bean_type = %bean_type, requested = input.count, available = pool.len(), "Rejected roastery transfer");
            e
        })?;
        let moved = pool.oldest(count).map_err(|available| LedgerViolation::InsufficientBags {
            bean_type: bean_type.clone(),
            requested: count,
            available,
        })?;

        let changes: ChangeSet = bags
            .iter()
            .filter(|b| moved.contains(&b.id))
            .map(|b| Mutation::UpdateBag {
                id: b.id,
                expected_status: BagStatus::InMain,
                expected_weight_kg: b.weight_kg,
                weight_kg: b.weight_kg,
                status: BagStatus::InRoastery,
            })
            .collect();
        self.store.apply(changes).await?;

        tracing::info!(bean_type = %bean_type, count = moved.len(), "Moved bags to roastery");

        Ok(TransferReceipt {
            bean_type,
            bag_ids: moved,
        })
    }

    /// Bags at the roastery grouped by bean type
    pub async fn roastery_stock(&self) -> AppResult<StockSummary> {
        let bags = self
            .store
            .list_bags(&BagQuery::with_status(BagStatus::InRoastery))
            .await?;
        Ok(StockSummary::from_bags(&bags))
    }
}
