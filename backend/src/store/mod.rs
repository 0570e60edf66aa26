//! The ledger store seam
//!
//! Every operation reads a snapshot through [`LedgerStore`], plans its
//! writes with the pure functions in `shared`, and submits them as one
//! [`ChangeSet`]. A store applies a change set entirely or not at all and
//! re-checks each mutation's precondition while doing so.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    AllocationGuard, Bag, BagStatus, BranchTransfer, DateRange, NewBag, NewBranchTransfer,
    NewRoastBatch, RoastBatch, Warehouse, WarehouseKind,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Filter for bag reads; results are ordered oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagQuery {
    pub bean_type: Option<String>,
    pub status: Option<BagStatus>,
    pub created: DateRange,
}

impl BagQuery {
    pub fn with_status(status: BagStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn bean_type(mut self, bean_type: impl Into<String>) -> Self {
        self.bean_type = Some(bean_type.into());
        self
    }

    pub fn created(mut self, range: DateRange) -> Self {
        self.created = range;
        self
    }
}

/// Filter for batch reads; results are ordered newest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchQuery {
    pub created: DateRange,
}

/// Filter for transfer reads; results are ordered oldest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferQuery {
    pub batch_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub created: DateRange,
}

/// One write inside a change set
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    InsertBags(Vec<NewBag>),

    /// Set a bag's weight and status, provided it still has the
    /// snapshot's status and weight
    UpdateBag {
        id: Uuid,
        expected_status: BagStatus,
        expected_weight_kg: Decimal,
        weight_kg: Decimal,
        status: BagStatus,
    },

    InsertBatch(NewRoastBatch),

    /// Insert a transfer once the guard passes against the batch's
    /// transfers as they are inside the write
    InsertTransfer {
        transfer: NewBranchTransfer,
        guard: AllocationGuard,
    },
}

/// Ordered mutations applied atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl FromIterator<Mutation> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

/// Identifiers the store assigned while applying a change set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReceipt {
    /// Inserted bags, in insertion order
    pub bag_ids: Vec<Uuid>,
    pub batch_id: Option<Uuid>,
    pub transfer_id: Option<Uuid>,
    pub committed_at: Option<DateTime<Utc>>,
}

/// Durable ledger state behind a select / insert / update contract
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_warehouses(&self, kind: Option<WarehouseKind>) -> AppResult<Vec<Warehouse>>;

    async fn list_bags(&self, query: &BagQuery) -> AppResult<Vec<Bag>>;

    async fn list_batches(&self, query: &BatchQuery) -> AppResult<Vec<RoastBatch>>;

    async fn get_batch(&self, id: Uuid) -> AppResult<Option<RoastBatch>>;

    async fn list_transfers(&self, query: &TransferQuery) -> AppResult<Vec<BranchTransfer>>;

    /// Apply every mutation or none
    async fn apply(&self, changes: ChangeSet) -> AppResult<ChangeReceipt>;

    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// The single warehouse of `kind`, if one exists
pub async fn find_site(store: &dyn LedgerStore, kind: WarehouseKind) -> AppResult<Option<Warehouse>> {
    Ok(store.list_warehouses(Some(kind)).await?.into_iter().next())
}
