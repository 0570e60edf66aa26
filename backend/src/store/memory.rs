//! In-memory ledger store
//!
//! Used for local runs without Postgres and by the integration tests. A
//! change set is applied to a scratch copy of the state, which replaces the
//! live state only when every mutation succeeded.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    Bag, BranchTransfer, NewBag, RoastBatch, Warehouse, WarehouseKind,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BagQuery, BatchQuery, ChangeReceipt, ChangeSet, LedgerStore, Mutation, TransferQuery};
use crate::error::{AppError, AppResult};

pub const MAIN_WAREHOUSE_NAME: &str = "المخزن الرئيسي";
pub const ROASTERY_NAME: &str = "المحمصة";

#[derive(Debug, Clone, Default)]
struct LedgerState {
    warehouses: Vec<Warehouse>,
    bags: Vec<Bag>,
    batches: Vec<RoastBatch>,
    transfers: Vec<BranchTransfer>,
}

/// Ledger state held in process memory
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: RwLock<LedgerState>,
    /// One-shot fault: fail the next change set after this many mutations
    fail_after: Mutex<Option<usize>>,
}

impl MemoryLedgerStore {
    /// A store holding the main warehouse and the roastery
    pub fn new() -> Self {
        Self::with_branches(std::iter::empty::<&str>())
    }

    /// A store holding the main warehouse, the roastery and the given branches
    pub fn with_branches<S: AsRef<str>>(branches: impl IntoIterator<Item = S>) -> Self {
        let mut warehouses = vec![
            Warehouse {
                id: Uuid::new_v4(),
                name: MAIN_WAREHOUSE_NAME.to_string(),
                kind: WarehouseKind::Main,
            },
            Warehouse {
                id: Uuid::new_v4(),
                name: ROASTERY_NAME.to_string(),
                kind: WarehouseKind::Roastery,
            },
        ];
        warehouses.extend(branches.into_iter().map(|name| Warehouse {
            id: Uuid::new_v4(),
            name: name.as_ref().to_string(),
            kind: WarehouseKind::Branch,
        }));

        Self {
            state: RwLock::new(LedgerState {
                warehouses,
                ..LedgerState::default()
            }),
            fail_after: Mutex::new(None),
        }
    }

    /// A store with no warehouses at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Make the next `apply` fail once `mutations` mutations have been applied
    pub fn inject_failure_after(&self, mutations: usize) {
        if let Ok(mut fail_after) = self.fail_after.lock() {
            *fail_after = Some(mutations);
        }
    }

    /// Insert a bag with an explicit creation time
    pub async fn seed_bag(&self, new_bag: NewBag, created_at: DateTime<Utc>) -> Bag {
        let bag = materialize_bag(new_bag, created_at);
        self.state.write().await.bags.push(bag.clone());
        bag
    }

    pub async fn add_branch(&self, name: &str) -> Warehouse {
        let branch = Warehouse {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: WarehouseKind::Branch,
        };
        self.state.write().await.warehouses.push(branch.clone());
        branch
    }

    /// Every bag regardless of status, in insertion order
    pub async fn all_bags(&self) -> Vec<Bag> {
        self.state.read().await.bags.clone()
    }

    pub async fn all_batches(&self) -> Vec<RoastBatch> {
        self.state.read().await.batches.clone()
    }

    pub async fn all_transfers(&self) -> Vec<BranchTransfer> {
        self.state.read().await.transfers.clone()
    }

    fn take_fault(&self) -> Option<usize> {
        self.fail_after.lock().ok().and_then(|mut f| f.take())
    }
}

fn materialize_bag(new_bag: NewBag, created_at: DateTime<Utc>) -> Bag {
    Bag {
        id: Uuid::new_v4(),
        bag_code: new_bag.bag_code,
        bean_type: new_bag.bean_type,
        weight_kg: new_bag.weight_kg,
        initial_weight_kg: new_bag.weight_kg,
        status: new_bag.status,
        warehouse_id: new_bag.warehouse_id,
        notes: new_bag.notes,
        created_at,
    }
}

impl LedgerState {
    fn apply_mutation(
        &mut self,
        mutation: Mutation,
        now: DateTime<Utc>,
        receipt: &mut ChangeReceipt,
    ) -> AppResult<()> {
        match mutation {
            Mutation::InsertBags(bags) => {
                for new_bag in bags {
                    if self.bags.iter().any(|b| b.bag_code == new_bag.bag_code) {
                        return Err(AppError::DuplicateEntry("bag_code".to_string()));
                    }
                    let bag = materialize_bag(new_bag, now);
                    receipt.bag_ids.push(bag.id);
                    self.bags.push(bag);
                }
            }
            Mutation::UpdateBag {
                id,
                expected_status,
                expected_weight_kg,
                weight_kg,
                status,
            } => {
                let bag = self
                    .bags
                    .iter_mut()
                    .find(|b| b.id == id)
                    .ok_or_else(|| AppError::NotFound("Bag".to_string()))?;
                if bag.status != expected_status || bag.weight_kg != expected_weight_kg {
                    return Err(AppError::stale("Bag"));
                }
                bag.weight_kg = weight_kg;
                bag.status = status;
            }
            Mutation::InsertBatch(new_batch) => {
                let batch = RoastBatch {
                    id: Uuid::new_v4(),
                    bean_type: Some(new_batch.bean_type),
                    roast_type: Some(new_batch.roast_type),
                    input_weight_kg: new_batch.input_weight_kg,
                    output_weight_kg: new_batch.output_weight_kg,
                    reprocessed_weight_kg: new_batch.reprocessed_weight_kg,
                    notes: new_batch.notes,
                    created_at: now,
                    inputs: new_batch.inputs,
                    outputs: new_batch.outputs,
                };
                receipt.batch_id = Some(batch.id);
                self.batches.push(batch);
            }
            Mutation::InsertTransfer { transfer, guard } => {
                if !self.batches.iter().any(|b| b.id == transfer.roasting_batch_id) {
                    return Err(AppError::NotFound("Roasting batch".to_string()));
                }
                let existing: Vec<BranchTransfer> = self
                    .transfers
                    .iter()
                    .filter(|t| t.roasting_batch_id == transfer.roasting_batch_id)
                    .cloned()
                    .collect();
                guard.check(transfer.weight_kg, &existing)?;

                let row = BranchTransfer {
                    id: Uuid::new_v4(),
                    roasting_batch_id: transfer.roasting_batch_id,
                    branch_id: transfer.branch_id,
                    weight_kg: transfer.weight_kg,
                    notes: Some(transfer.notes),
                    created_at: now,
                };
                receipt.transfer_id = Some(row.id);
                self.transfers.push(row);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn list_warehouses(&self, kind: Option<WarehouseKind>) -> AppResult<Vec<Warehouse>> {
        let state = self.state.read().await;
        Ok(state
            .warehouses
            .iter()
            .filter(|w| kind.map_or(true, |k| w.kind == k))
            .cloned()
            .collect())
    }

    async fn list_bags(&self, query: &BagQuery) -> AppResult<Vec<Bag>> {
        let state = self.state.read().await;
        let mut bags: Vec<Bag> = state
            .bags
            .iter()
            .filter(|b| query.status.map_or(true, |s| b.status == s))
            .filter(|b| query.bean_type.as_deref().map_or(true, |t| b.bean_type == t))
            .filter(|b| query.created.contains(b.created_at))
            .cloned()
            .collect();
        bags.sort_by_key(|b| b.created_at);
        Ok(bags)
    }

    async fn list_batches(&self, query: &BatchQuery) -> AppResult<Vec<RoastBatch>> {
        let state = self.state.read().await;
        let mut batches: Vec<RoastBatch> = state
            .batches
            .iter()
            .filter(|b| query.created.contains(b.created_at))
            .cloned()
            .collect();
        // newest first; among equal timestamps the later insert first
        batches.reverse();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(batches)
    }

    async fn get_batch(&self, id: Uuid) -> AppResult<Option<RoastBatch>> {
        let state = self.state.read().await;
        Ok(state.batches.iter().find(|b| b.id == id).cloned())
    }

    async fn list_transfers(&self, query: &TransferQuery) -> AppResult<Vec<BranchTransfer>> {
        let state = self.state.read().await;
        Ok(state
            .transfers
            .iter()
            .filter(|t| query.batch_id.map_or(true, |id| t.roasting_batch_id == id))
            .filter(|t| query.branch_id.map_or(true, |id| t.branch_id == id))
            .filter(|t| query.created.contains(t.created_at))
            .cloned()
            .collect())
    }

    async fn apply(&self, changes: ChangeSet) -> AppResult<ChangeReceipt> {
        let fault = self.take_fault();
        let mut state = self.state.write().await;
        let mut scratch = state.clone();
        let now = Utc::now();
        let mut receipt = ChangeReceipt::default();

        for (applied, mutation) in changes.into_mutations().into_iter().enumerate() {
            if fault == Some(applied) {
                return Err(AppError::Internal("injected store failure".to_string()));
            }
            scratch.apply_mutation(mutation, now, &mut receipt)?;
        }

        *state = scratch;
        receipt.committed_at = Some(now);
        Ok(receipt)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
