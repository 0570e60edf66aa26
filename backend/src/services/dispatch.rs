//! Dispatching roasted output lines to retail branches

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    dispatch_notes, open_allocations, validate_weight, AllocationGuard, AllocationOptions,
    LedgerViolation, NewBranchTransfer, OutputAllocation, WarehouseKind,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{BatchQuery, ChangeSet, LedgerStore, Mutation, TransferQuery};

#[derive(Clone)]
pub struct DispatchService {
    store: Arc<dyn LedgerStore>,
    options: AllocationOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchInput {
    pub roasting_batch_id: Uuid,
    /// Output line label; a full `"label (w كجم)"` item is accepted too
    pub roast_type: String,
    pub branch_id: Uuid,
    pub weight_kg: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchReceipt {
    pub transfer_id: Uuid,
    pub roasting_batch_id: Uuid,
    pub branch_id: Uuid,
    pub roast_type: String,
    pub weight_kg: Decimal,
    /// What the line has left after this transfer
    pub remaining_kg: Decimal,
}

impl DispatchService {
    pub fn new(store: Arc<dyn LedgerStore>, options: AllocationOptions) -> Self {
        Self { store, options }
    }

    /// Output lines with roasted coffee still to send, newest batch first
    pub async fn available(&self) -> AppResult<Vec<OutputAllocation>> {
        let batches = self.store.list_batches(&BatchQuery::default()).await?;
        let transfers = self.store.list_transfers(&TransferQuery::default()).await?;
        Ok(open_allocations(&batches, &transfers, self.options))
    }

    /// Send `weight_kg` of one output line to a branch
    pub async fn dispatch(&self, input: DispatchInput) -> AppResult<DispatchReceipt> {
        validate_weight("weight_kg", input.weight_kg)?;

        let branches = self.store.list_warehouses(Some(WarehouseKind::Branch)).await?;
        if !branches.iter().any(|b| b.id == input.branch_id) {
            return Err(AppError::NotFound("Branch".to_string()));
        }

        let batch = self
            .store
            .get_batch(input.roasting_batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Roasting batch".to_string()))?;
        let guard = AllocationGuard::for_line(&batch, &input.roast_type, self.options).ok_or_else(|| {
            LedgerViolation::UnknownOutputLine {
                roast_type: input.roast_type.trim().to_string(),
            }
        })?;

        let transfers = self
            .store
            .list_transfers(&TransferQuery {
                batch_id: Some(batch.id),
                ..TransferQuery::default()
            })
            .await?;
        let available_kg = guard.available_kg(&transfers);
        if let Err(violation) = guard.check(input.weight_kg, &transfers) {
            tracing::warn!(
                batch_id = %batch.id,
                roast_type = %guard.roast_type,
                requested_kg = %input.weight_kg,
                available_kg = %available_kg,
                "Rejected dispatch"
            );
            return Err(violation.into());
        }

        let roast_type = guard.roast_type.clone();
        let mut changes = ChangeSet::new();
        changes.push(Mutation::InsertTransfer {
            transfer: NewBranchTransfer {
                roasting_batch_id: batch.id,
                branch_id: input.branch_id,
                weight_kg: input.weight_kg,
                notes: dispatch_notes(&roast_type, input.notes.as_deref().unwrap_or_default()),
            },
            guard,
        });
        let receipt = self.store.apply(changes).await?;
        let transfer_id = receipt
            .transfer_id
            .ok_or_else(|| AppError::Internal("Store did not return the transfer id".to_string()))?;

        tracing::info!(
            transfer_id = %transfer_id,
            batch_id = %batch.id,
            branch_id = %input.branch_id,
            roast_type = %roast_type,
            weight_kg = %input.weight_kg,
            "Dispatched roasted coffee to branch"
        );

        Ok(DispatchReceipt {
            transfer_id,
            roasting_batch_id: batch.id,
            branch_id: input.branch_id,
            roast_type,
            weight_kg: input.weight_kg,
            remaining_kg: available_kg - input.weight_kg,
        })
    }
}
