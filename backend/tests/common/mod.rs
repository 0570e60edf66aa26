//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use roastery_inventory_backend::services::dispatch::DispatchInput;
use roastery_inventory_backend::services::roasting::{
    RecordRoastInput, RoastInputLine, RoastOutputLine,
};
use roastery_inventory_backend::services::{
    DispatchService, IntakeService, ReportingService, RoastingService, TransferService,
};
use roastery_inventory_backend::store::{LedgerStore, MemoryLedgerStore};
use rust_decimal::Decimal;
use shared::{AllocationOptions, Bag, BagStatus, NewBag, Warehouse, WarehouseKind};
use uuid::Uuid;

pub const BRANCHES: [&str; 2] = ["فرع العليا", "فرع النخيل"];

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Services wired to one in-memory store
pub struct Ledger {
    pub store: Arc<MemoryLedgerStore>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryLedgerStore::with_branches(BRANCHES)),
        }
    }

    pub fn dyn_store(&self) -> Arc<dyn LedgerStore> {
        self.store.clone()
    }

    pub fn intake(&self) -> IntakeService {
        IntakeService::new(self.dyn_store())
    }

    pub fn transfer(&self) -> TransferService {
        TransferService::new(self.dyn_store())
    }

    pub fn roasting(&self) -> RoastingService {
        RoastingService::new(self.dyn_store(), dec("0.5"))
    }

    pub fn dispatch(&self) -> DispatchService {
        DispatchService::new(self.dyn_store(), AllocationOptions::default())
    }

    pub fn reporting(&self) -> ReportingService {
        ReportingService::new(self.dyn_store())
    }

    pub async fn branch(&self, name: &str) -> Warehouse {
        self.store
            .list_warehouses(Some(WarehouseKind::Branch))
            .await
            .unwrap()
            .into_iter()
            .find(|w| w.name == name)
            .unwrap()
    }

    pub async fn site(&self, kind: WarehouseKind) -> Warehouse {
        self.store
            .list_warehouses(Some(kind))
            .await
            .unwrap()
            .remove(0)
    }

    /// Seed bags one minute apart starting at `start`, in the given order
    pub async fn seed_bags(
        &self,
        bean_type: &str,
        weights: &[&str],
        status: BagStatus,
        start: DateTime<Utc>,
    ) -> Vec<Bag> {
        let mut bags = Vec::new();
        for (i, weight) in weights.iter().enumerate() {
            let bag = self
                .store
                .seed_bag(
                    NewBag {
                        bag_code: format!("SEED_{}_{}", Uuid::new_v4(), i + 1),
                        bean_type: bean_type.to_string(),
                        weight_kg: dec(weight),
                        status,
                        warehouse_id: None,
                        notes: None,
                    },
                    start + Duration::minutes(i as i64),
                )
                .await;
            bags.push(bag);
        }
        bags
    }

    pub async fn bag(&self, id: Uuid) -> Bag {
        self.store
            .all_bags()
            .await
            .into_iter()
            .find(|b| b.id == id)
            .unwrap()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

pub fn roast(
    inputs: &[(&str, &str)],
    outputs: &[(&str, &str)],
    reprocessed: Option<&str>,
) -> RecordRoastInput {
    RecordRoastInput {
        inputs: inputs
            .iter()
            .map(|(bean_type, w)| RoastInputLine {
                bean_type: bean_type.to_string(),
                weight_kg: dec(w),
            })
            .collect(),
        outputs: outputs
            .iter()
            .map(|(roast_type, w)| RoastOutputLine {
                roast_type: roast_type.to_string(),
                weight_kg: dec(w),
            })
            .collect(),
        reprocessed_weight_kg: reprocessed.map(dec),
        notes: None,
    }
}

pub fn dispatch_input(batch_id: Uuid, roast_type: &str, branch_id: Uuid, weight: &str) -> DispatchInput {
    DispatchInput {
        roasting_batch_id: batch_id,
        roast_type: roast_type.to_string(),
        branch_id,
        weight_kg: dec(weight),
        notes: None,
    }
}
