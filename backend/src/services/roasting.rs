//! Roasting batches: validation, FIFO deduction, and batch history

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    encode_lines, parse_encoded_lines, reprocess_code, total_weight, validate_roast, Bag, BagStatus,
    BatchLine, DateRange, Deduction, FifoPool, LedgerViolation, NewBag, NewRoastBatch, RoastBatch,
    RoastTotals, WarehouseKind, REPROCESSED_BEAN_TYPE,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{find_site, BagQuery, BatchQuery, ChangeSet, LedgerStore, Mutation};

/// Roasting service for recording batches against roastery stock
#[derive(Clone)]
pub struct RoastingService {
    store: Arc<dyn LedgerStore>,
    high_waste_threshold_kg: Decimal,
}

/// Green bean drawn into a roast
#[derive(Debug, Clone, Deserialize)]
pub struct RoastInputLine {
    pub bean_type: String,
    pub weight_kg: Decimal,
}

/// Roasted coffee produced by a roast
#[derive(Debug, Clone, Deserialize)]
pub struct RoastOutputLine {
    pub roast_type: String,
    pub weight_kg: Decimal,
}

/// Input for recording (or previewing) a roasting batch
#[derive(Debug, Clone, Deserialize)]
pub struct RecordRoastInput {
    pub inputs: Vec<RoastInputLine>,
    pub outputs: Vec<RoastOutputLine>,
    /// Blend-back material returned to the roastery; present only when
    /// reprocessing is flagged
    pub reprocessed_weight_kg: Option<Decimal>,
    pub notes: Option<String>,
}

impl RecordRoastInput {
    fn input_lines(&self) -> Vec<BatchLine> {
        self.inputs
            .iter()
            .map(|l| BatchLine::new(l.bean_type.trim(), l.weight_kg))
            .collect()
    }

    fn output_lines(&self) -> Vec<BatchLine> {
        self.outputs
            .iter()
            .map(|l| BatchLine::new(l.roast_type.trim(), l.weight_kg))
            .collect()
    }
}

/// What one recorded roast changed
#[derive(Debug, Clone, Serialize)]
pub struct RoastReceipt {
    pub batch_id: Uuid,
    pub totals: RoastTotals,
    pub is_high_waste: bool,
    /// Net weight taken from each roastery bag
    pub deductions: Vec<Deduction>,
    pub reprocessed_bag_id: Option<Uuid>,
    pub reprocessed_bag_code: Option<String>,
}

/// A batch with its lines resolved for display
#[derive(Debug, Clone, Serialize)]
pub struct BatchDetail {
    pub batch: RoastBatch,
    pub inputs: Vec<BatchLine>,
    pub outputs: Vec<BatchLine>,
    pub total_output_kg: Decimal,
    pub waste_kg: Decimal,
    pub is_high_waste: bool,
}

/// Per bean type pools drawn in the order input lines name them
#[derive(Default)]
struct RoasteryPools {
    pools: Vec<(String, FifoPool)>,
}

impl RoasteryPools {
    fn withdraw(&mut self, snapshot: &[Bag], line: &BatchLine) -> Result<(), LedgerViolation> {
        let index = match self.pools.iter().position(|(t, _)| *t == line.label) {
            Some(index) => index,
            None => {
                let pool = FifoPool::from_bags(snapshot.iter().filter(|b| b.bean_type == line.label));
                self.pools.push((line.label.clone(), pool));
                self.pools.len() - 1
            }
        };
        let pool = &mut self.pools[index].1;
        pool.withdraw(line.weight_kg)
            .map(|_| ())
            .map_err(|shortfall| LedgerViolation::InsufficientWeight {
                bean_type: line.label.clone(),
                requested_kg: shortfall.requested_kg,
                available_kg: shortfall.available_kg,
            })
    }

    fn net_deductions(&self) -> Vec<Deduction> {
        self.pools.iter().flat_map(|(_, p)| p.net_deductions()).collect()
    }
}

impl RoastingService {
    pub fn new(store: Arc<dyn LedgerStore>, high_waste_threshold_kg: Decimal) -> Self {
        Self {
            store,
            high_waste_threshold_kg,
        }
    }

    /// Validate a roast and compute its totals without writing anything
    pub fn preview(&self, input: &RecordRoastInput) -> AppResult<RoastTotals> {
        let totals = validate_roast(
            &input.input_lines(),
            &input.output_lines(),
            input.reprocessed_weight_kg,
        )?;
        Ok(totals)
    }

    /// Record a roast as one atomic change set: the batch, the FIFO
    /// deduction from roastery bags, and the reprocessed bag if any
    pub async fn record(&self, input: RecordRoastInput) -> AppResult<RoastReceipt> {
        let inputs = input.input_lines();
        let outputs = input.output_lines();
        let totals = validate_roast(&inputs, &outputs, input.reprocessed_weight_kg)?;

        let snapshot = self
            .store
            .list_bags(&BagQuery::with_status(BagStatus::InRoastery))
            .await?;
        let mut pools = RoasteryPools::default();
        for line in &inputs {
            if let Err(violation) = pools.withdraw(&snapshot, line) {
                tracing::warn!(error = %violation, "Rejected roast: roastery stock too low");
                return Err(violation.into());
            }
        }
        let deductions = pools.net_deductions();

        let mut changes = ChangeSet::new();
        changes.push(Mutation::InsertBatch(NewRoastBatch {
            bean_type: encode_lines(&inputs),
            roast_type: encode_lines(&outputs),
            input_weight_kg: totals.input_kg,
            output_weight_kg: totals.output_kg,
            reprocessed_weight_kg: totals.reprocessed_kg,
            notes: input.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            inputs,
            outputs,
        }));
        for deduction in &deductions {
            changes.push(Mutation::UpdateBag {
                id: deduction.lot_id,
                expected_status: BagStatus::InRoastery,
                expected_weight_kg: deduction.before_kg,
                weight_kg: deduction.after_kg,
                status: if deduction.exhausts_lot() {
                    BagStatus::Used
                } else {
                    BagStatus::InRoastery
                },
            });
        }

        let reprocessed_bag_code = if totals.reprocessed_kg > Decimal::ZERO {
            let roastery = find_site(self.store.as_ref(), WarehouseKind::Roastery).await?;
            let now = Utc::now();
            let code = reprocess_code(now);
            changes.push(Mutation::InsertBags(vec![NewBag {
                bag_code: code.clone(),
                bean_type: REPROCESSED_BEAN_TYPE.to_string(),
                weight_kg: totals.reprocessed_kg,
                status: BagStatus::InRoastery,
                warehouse_id: roastery.map(|w| w.id),
                notes: Some(format!(
                    "تمت إضافته من عملية تحميص بتاريخ {} - (رمز: {})",
                    now.format("%Y-%m-%d"),
                    code
                )),
            }]));
            Some(code)
        } else {
            None
        };

        let receipt = self.store.apply(changes).await?;
        let batch_id = receipt
            .batch_id
            .ok_or_else(|| AppError::Internal("Store did not return the batch id".to_string()))?;

        tracing::info!(
            batch_id = %batch_id,
            input_kg = %totals.input_kg,
            output_kg = %totals.output_kg,
            reprocessed_kg = %totals.reprocessed_kg,
            waste_kg = %totals.waste_kg,
            bags_touched = deductions.len(),
            "Recorded roasting batch"
        );

        Ok(RoastReceipt {
            batch_id,
            is_high_waste: totals.is_high_waste(self.high_waste_threshold_kg),
            totals,
            deductions,
            reprocessed_bag_id: receipt.bag_ids.first().copied(),
            reprocessed_bag_code,
        })
    }

    /// Batches newest first, limited to rows carrying line structure
    pub async fn history(&self, range: DateRange) -> AppResult<Vec<RoastBatch>> {
        let batches = self
            .store
            .list_batches(&BatchQuery { created: range })
            .await?;
        Ok(batches
            .into_iter()
            .filter(RoastBatch::has_line_structure)
            .collect())
    }

    pub async fn detail(&self, batch_id: Uuid) -> AppResult<BatchDetail> {
        let batch = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Roasting batch".to_string()))?;
        Ok(self.describe(batch))
    }

    fn describe(&self, batch: RoastBatch) -> BatchDetail {
        let inputs = if batch.inputs.is_empty() {
            parse_encoded_lines(batch.bean_type.as_deref().unwrap_or_default())
        } else {
            batch.inputs.clone()
        };
        let outputs = if batch.outputs.is_empty() {
            parse_encoded_lines(batch.roast_type.as_deref().unwrap_or_default())
        } else {
            batch.outputs.clone()
        };
        let total_output_kg = total_weight(&outputs);
        let waste_kg = batch.input_weight_kg - total_output_kg - batch.reprocessed_weight_kg;

        BatchDetail {
            inputs,
            outputs,
            total_output_kg,
            waste_kg,
            is_high_waste: waste_kg > self.high_waste_threshold_kg,
            batch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedgerStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn legacy_batch(bean_type: &str, roast_type: &str, input: &str, reprocessed: &str) -> RoastBatch {
        RoastBatch {
            id: Uuid::new_v4(),
            bean_type: Some(bean_type.to_string()),
            roast_type: Some(roast_type.to_string()),
            input_weight_kg: dec(input),
            output_weight_kg: Decimal::ZERO,
            reprocessed_weight_kg: dec(reprocessed),
            notes: None,
            created_at: Utc::now(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    #[test]
    fn test_detail_parses_encoded_rows() {
        let service = RoastingService::new(Arc::new(MemoryLedgerStore::new()), dec("0.5"));
        let detail = service.describe(legacy_batch(
            "يمني (25.00 كجم), حبشي (25.00 كجم)",
            "سلطان وسط (30.00 كجم), حبشي وسط (15.00 كجم)",
            "50",
            "4",
        ));
        assert_eq!(detail.inputs.len(), 2);
        assert_eq!(detail.total_output_kg, dec("45.00"));
        assert_eq!(detail.waste_kg, dec("1.00"));
        assert!(detail.is_high_waste);
    }

    #[test]
    fn test_waste_at_threshold_is_not_flagged() {
        let service = RoastingService::new(Arc::new(MemoryLedgerStore::new()), dec("0.5"));
        let detail = service.describe(legacy_batch("يمني (10.00 كجم)", "يمني وسط (9.50 كجم)", "10", "0"));
        assert_eq!(detail.waste_kg, dec("0.50"));
        assert!(!detail.is_high_waste);
    }

    #[test]
    fn test_preview_reports_waste() {
        let service = RoastingService::new(Arc::new(MemoryLedgerStore::new()), dec("0.5"));
        let input = RecordRoastInput {
            inputs: vec![RoastInputLine {
                bean_type: "يمني".to_string(),
                weight_kg: dec("50"),
            }],
            outputs: vec![RoastOutputLine {
                roast_type: "سلطان وسط".to_string(),
                weight_kg: dec("30"),
            }],
            reprocessed_weight_kg: Some(dec("5")),
            notes: None,
        };
        let totals = service.preview(&input).unwrap();
        assert_eq!(totals.waste_kg, dec("15"));
    }
}
