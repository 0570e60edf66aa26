//! Stock and branch report aggregation over fetched snapshots

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Bag, BranchTransfer, RoastBatch, Warehouse, REPROCESSED_BEAN_TYPE, UNSPECIFIED_LABEL};

/// Stock of one bean type at a warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeanTypeStock {
    pub bean_type: String,
    pub bag_count: usize,
    pub total_weight_kg: Decimal,
    pub is_reprocessed: bool,
    /// First non-empty note among the group's bags
    pub notes: Option<String>,
}

/// Per-type stock of one warehouse plus totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSummary {
    pub groups: Vec<BeanTypeStock>,
    pub total_bags: usize,
    pub total_weight_kg: Decimal,
}

/// Group bags by bean type, keeping the order types first appear in
pub fn group_by_bean_type<'a>(bags: impl IntoIterator<Item = &'a Bag>) -> Vec<BeanTypeStock> {
    let mut groups: Vec<BeanTypeStock> = Vec::new();
    for bag in bags {
        let note = bag.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
        match groups.iter_mut().find(|g| g.bean_type == bag.bean_type) {
            Some(group) => {
                group.bag_count += 1;
                group.total_weight_kg += bag.weight_kg;
                if group.notes.is_none() {
                    group.notes = note.map(str::to_string);
                }
            }
            None => groups.push(BeanTypeStock {
                bean_type: bag.bean_type.clone(),
                bag_count: 1,
                total_weight_kg: bag.weight_kg,
                is_reprocessed: bag.bean_type == REPROCESSED_BEAN_TYPE,
                notes: note.map(str::to_string),
            }),
        }
    }
    groups
}

impl StockSummary {
    pub fn from_bags(bags: &[Bag]) -> Self {
        let groups = group_by_bean_type(bags);
        Self {
            total_bags: bags.len(),
            total_weight_kg: bags.iter().map(|b| b.weight_kg).sum(),
            groups,
        }
    }
}

/// Roasted coffee a branch received of one roast label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchStockRow {
    pub branch_name: String,
    pub roast_type: String,
    pub total_weight_kg: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchStockReport {
    pub rows: Vec<BranchStockRow>,
    pub grand_total_kg: Decimal,
}

/// Label a transfer is reported under: its notes prefix, else the batch text
fn report_label(transfer: &BranchTransfer, batches: &HashMap<Uuid, &RoastBatch>) -> String {
    if let Some(label) = transfer.roast_label() {
        return label.to_string();
    }
    batches
        .get(&transfer.roasting_batch_id)
        .and_then(|b| b.roast_type.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("-")
        .to_string()
}

impl BranchStockReport {
    /// Aggregate `transfers` per (branch, roast label) in first-seen order
    pub fn build(transfers: &[BranchTransfer], branches: &[Warehouse], batches: &[RoastBatch]) -> Self {
        let names: HashMap<Uuid, &str> = branches.iter().map(|w| (w.id, w.name.as_str())).collect();
        let by_id: HashMap<Uuid, &RoastBatch> = batches.iter().map(|b| (b.id, b)).collect();

        let mut rows: Vec<BranchStockRow> = Vec::new();
        for transfer in transfers {
            let branch_name = names.get(&transfer.branch_id).copied().unwrap_or(UNSPECIFIED_LABEL).to_string();
            let roast_type = report_label(transfer, &by_id);
            match rows
                .iter_mut()
                .find(|r| r.branch_name == branch_name && r.roast_type == roast_type)
            {
                Some(row) => row.total_weight_kg += transfer.weight_kg,
                None => rows.push(BranchStockRow {
                    branch_name,
                    roast_type,
                    total_weight_kg: transfer.weight_kg,
                }),
            }
        }

        Self {
            grand_total_kg: transfers.iter().map(|t| t.weight_kg).sum(),
            rows,
        }
    }
}
