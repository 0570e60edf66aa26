//! Reporting service for branch stock and data export

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{BranchStockReport, BranchStockRow, DateRange, WarehouseKind};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{BatchQuery, LedgerStore, TransferQuery};

/// Label of the grand total row in exports
pub const GRAND_TOTAL_LABEL: &str = "الإجمالي";

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn LedgerStore>,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct BranchStockFilter {
    pub branch_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Roasted coffee each branch received, per roast label
    pub async fn branch_stock(&self, filter: &BranchStockFilter) -> AppResult<BranchStockReport> {
        let branches = self.store.list_warehouses(Some(WarehouseKind::Branch)).await?;
        if let Some(branch_id) = filter.branch_id {
            if !branches.iter().any(|b| b.id == branch_id) {
                return Err(AppError::NotFound("Branch".to_string()));
            }
        }

        let transfers = self
            .store
            .list_transfers(&TransferQuery {
                batch_id: None,
                branch_id: filter.branch_id,
                created: DateRange::new(filter.from, filter.to),
            })
            .await?;
        let batches = self.store.list_batches(&BatchQuery::default()).await?;

        Ok(BranchStockReport::build(&transfers, &branches, &batches))
    }

    /// Rows of `report` followed by a grand total row
    pub fn export_rows(report: &BranchStockReport) -> Vec<BranchStockRow> {
        let mut rows = report.rows.clone();
        rows.push(BranchStockRow {
            branch_name: GRAND_TOTAL_LABEL.to_string(),
            roast_type: "-".to_string(),
            total_weight_kg: report.grand_total_kg,
        });
        rows
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_csv_export_has_header_and_total() {
        let report = BranchStockReport {
            rows: vec![BranchStockRow {
                branch_name: "فرع العليا".to_string(),
                roast_type: "سلطان وسط".to_string(),
                total_weight_kg: Decimal::new(155, 1),
            }],
            grand_total_kg: Decimal::new(155, 1),
        };
        let csv = ReportingService::export_to_csv(&ReportingService::export_rows(&report)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "branch_name,roast_type,total_weight_kg");
        assert_eq!(lines[1], "فرع العليا,سلطان وسط,15.5");
        assert_eq!(lines[2], "الإجمالي,-,15.5");
    }
}
