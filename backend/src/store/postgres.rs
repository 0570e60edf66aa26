//! PostgreSQL ledger store
//!
//! A change set runs inside one transaction. Bag updates are conditional on
//! the snapshot status and weight; transfer inserts lock the batch row and
//! re-check the allocation guard before writing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Bag, BagStatus, BatchLine, BranchTransfer, LineDirection, NewRoastBatch, RoastBatch,
    Warehouse, WarehouseKind,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::{BagQuery, BatchQuery, ChangeReceipt, ChangeSet, LedgerStore, Mutation, TransferQuery};
use crate::error::{AppError, AppResult};

/// Ledger store over a Postgres pool
#[derive(Clone)]
pub struct PgLedgerStore {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct WarehouseRow {
    id: Uuid,
    name: String,
    kind: String,
}

#[derive(Debug, FromRow)]
struct BagRow {
    id: Uuid,
    bag_code: String,
    bean_type: String,
    weight_kg: Decimal,
    initial_weight_kg: Decimal,
    status: String,
    warehouse_id: Option<Uuid>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    bean_type: Option<String>,
    roast_type: Option<String>,
    input_weight_kg: Decimal,
    output_weight_kg: Decimal,
    reprocessed_weight_kg: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    batch_id: Uuid,
    direction: String,
    label: String,
    weight_kg: Decimal,
}

#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    roasting_batch_id: Uuid,
    branch_id: Uuid,
    weight_kg: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WarehouseRow> for Warehouse {
    type Error = AppError;

    fn try_from(row: WarehouseRow) -> AppResult<Self> {
        let kind = WarehouseKind::from_str(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown warehouse kind: {}", row.kind)))?;
        Ok(Warehouse {
            id: row.id,
            name: row.name,
            kind,
        })
    }
}

impl TryFrom<BagRow> for Bag {
    type Error = AppError;

    fn try_from(row: BagRow) -> AppResult<Self> {
        let status = BagStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown bag status: {}", row.status)))?;
        Ok(Bag {
            id: row.id,
            bag_code: row.bag_code,
            bean_type: row.bean_type,
            weight_kg: row.weight_kg,
            initial_weight_kg: row.initial_weight_kg,
            status,
            warehouse_id: row.warehouse_id,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

impl From<BatchRow> for RoastBatch {
    fn from(row: BatchRow) -> Self {
        RoastBatch {
            id: row.id,
            bean_type: row.bean_type,
            roast_type: row.roast_type,
            input_weight_kg: row.input_weight_kg,
            output_weight_kg: row.output_weight_kg,
            reprocessed_weight_kg: row.reprocessed_weight_kg,
            notes: row.notes,
            created_at: row.created_at,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl From<TransferRow> for BranchTransfer {
    fn from(row: TransferRow) -> Self {
        BranchTransfer {
            id: row.id,
            roasting_batch_id: row.roasting_batch_id,
            branch_id: row.branch_id,
            weight_kg: row.weight_kg,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const BATCH_COLUMNS: &str = "id, bean_type, roast_type, input_weight_kg, output_weight_kg, \
     reprocessed_weight_kg, notes, created_at";

const TRANSFER_COLUMNS: &str = "id, roasting_batch_id, branch_id, weight_kg, notes, created_at";

/// Map a unique-constraint failure to `DuplicateEntry`
fn insert_error(err: sqlx::Error, field: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::DuplicateEntry(field.to_string());
        }
    }
    AppError::DatabaseError(err)
}

impl PgLedgerStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    /// Attach normalized lines to `batches`
    async fn with_lines(&self, mut batches: Vec<RoastBatch>) -> AppResult<Vec<RoastBatch>> {
        if batches.is_empty() {
            return Ok(batches);
        }
        let ids: Vec<Uuid> = batches.iter().map(|b| b.id).collect();
        let lines = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT batch_id, direction, label, weight_kg
            FROM roasting_batch_lines
            WHERE batch_id = ANY($1)
            ORDER BY batch_id, direction, position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        for line in lines {
            let Some(batch) = batches.iter_mut().find(|b| b.id == line.batch_id) else {
                continue;
            };
            let entry = BatchLine::new(line.label, line.weight_kg);
            match LineDirection::from_str(&line.direction) {
                Some(LineDirection::Input) => batch.inputs.push(entry),
                Some(LineDirection::Output) => batch.outputs.push(entry),
                None => {
                    return Err(AppError::Internal(format!(
                        "Unknown line direction: {}",
                        line.direction
                    )))
                }
            }
        }
        Ok(batches)
    }

    async fn insert_batch(conn: &mut PgConnection, batch: NewRoastBatch) -> AppResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO roasting_batches (
                bean_type, roast_type, input_weight_kg, output_weight_kg,
                reprocessed_weight_kg, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&batch.bean_type)
        .bind(&batch.roast_type)
        .bind(batch.input_weight_kg)
        .bind(batch.output_weight_kg)
        .bind(batch.reprocessed_weight_kg)
        .bind(&batch.notes)
        .fetch_one(&mut *conn)
        .await?;

        let sides = [
            (LineDirection::Input, &batch.inputs),
            (LineDirection::Output, &batch.outputs),
        ];
        for (direction, lines) in sides {
            for (position, line) in lines.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO roasting_batch_lines (batch_id, direction, position, label, weight_kg)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(id)
                .bind(direction.as_str())
                .bind(position as i32)
                .bind(&line.label)
                .bind(line.weight_kg)
                .execute(&mut *conn)
                .await?;
            }
        }
        Ok(id)
    }

    async fn apply_mutation(
        conn: &mut PgConnection,
        mutation: Mutation,
        receipt: &mut ChangeReceipt,
    ) -> AppResult<()> {
        match mutation {
            Mutation::InsertBags(bags) => {
                for bag in bags {
                    let id: Uuid = sqlx::query_scalar(
                        r#"
                        INSERT INTO green_bags (
                            bag_code, bean_type, weight_kg, initial_weight_kg,
                            status, warehouse_id, notes
                        )
                        VALUES ($1, $2, $3, $3, $4, $5, $6)
                        RETURNING id
                        "#,
                    )
                    .bind(&bag.bag_code)
                    .bind(&bag.bean_type)
                    .bind(bag.weight_kg)
                    .bind(bag.status.as_str())
                    .bind(bag.warehouse_id)
                    .bind(&bag.notes)
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| insert_error(e, "bag_code"))?;
                    receipt.bag_ids.push(id);
                }
            }
            Mutation::UpdateBag {
                id,
                expected_status,
                expected_weight_kg,
                weight_kg,
                status,
            } => {
                let result = sqlx::query(
                    r#"
                    UPDATE green_bags
                    SET weight_kg = $1, status = $2
                    WHERE id = $3 AND status = $4 AND weight_kg = $5
                    "#,
                )
                .bind(weight_kg)
                .bind(status.as_str())
                .bind(id)
                .bind(expected_status.as_str())
                .bind(expected_weight_kg)
                .execute(&mut *conn)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::stale("Bag"));
                }
            }
            Mutation::InsertBatch(batch) => {
                receipt.batch_id = Some(Self::insert_batch(conn, batch).await?);
            }
            Mutation::InsertTransfer { transfer, guard } => {
                let locked: Option<Uuid> =
                    sqlx::query_scalar("SELECT id FROM roasting_batches WHERE id = $1 FOR UPDATE")
                        .bind(transfer.roasting_batch_id)
                        .fetch_optional(&mut *conn)
                        .await?;
                if locked.is_none() {
                    return Err(AppError::NotFound("Roasting batch".to_string()));
                }

                let existing: Vec<BranchTransfer> = sqlx::query_as::<_, TransferRow>(&format!(
                    "SELECT {} FROM branch_transfers WHERE roasting_batch_id = $1 ORDER BY created_at, seq",
                    TRANSFER_COLUMNS
                ))
                .bind(transfer.roasting_batch_id)
                .fetch_all(&mut *conn)
                .await?
                .into_iter()
                .map(BranchTransfer::from)
                .collect();
                guard.check(transfer.weight_kg, &existing)?;

                let id: Uuid = sqlx::query_scalar(
                    r#"
                    INSERT INTO branch_transfers (roasting_batch_id, branch_id, weight_kg, notes)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(transfer.roasting_batch_id)
                .bind(transfer.branch_id)
                .bind(transfer.weight_kg)
                .bind(&transfer.notes)
                .fetch_one(&mut *conn)
                .await?;
                receipt.transfer_id = Some(id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn list_warehouses(&self, kind: Option<WarehouseKind>) -> AppResult<Vec<Warehouse>> {
        let rows = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, name, kind
            FROM warehouses
            WHERE ($1::text IS NULL OR kind = $1)
            ORDER BY created_at, name
            "#,
        )
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Warehouse::try_from).collect()
    }

    async fn list_bags(&self, query: &BagQuery) -> AppResult<Vec<Bag>> {
        let rows = sqlx::query_as::<_, BagRow>(
            r#"
            SELECT id, bag_code, bean_type, weight_kg, initial_weight_kg,
                   status, warehouse_id, notes, created_at
            FROM green_bags
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR bean_type = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.bean_type.as_deref())
        .bind(query.created.start())
        .bind(query.created.end())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Bag::try_from).collect()
    }

    async fn list_batches(&self, query: &BatchQuery) -> AppResult<Vec<RoastBatch>> {
        let batches: Vec<RoastBatch> = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {}
            FROM roasting_batches
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            ORDER BY created_at DESC, seq DESC
            "#,
            BATCH_COLUMNS
        ))
        .bind(query.created.start())
        .bind(query.created.end())
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(RoastBatch::from)
        .collect();

        self.with_lines(batches).await
    }

    async fn get_batch(&self, id: Uuid) -> AppResult<Option<RoastBatch>> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM roasting_batches WHERE id = $1",
            BATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => Ok(self.with_lines(vec![row.into()]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_transfers(&self, query: &TransferQuery) -> AppResult<Vec<BranchTransfer>> {
        let rows = sqlx::query_as::<_, TransferRow>(&format!(
            r#"
            SELECT {}
            FROM branch_transfers
            WHERE ($1::uuid IS NULL OR roasting_batch_id = $1)
              AND ($2::uuid IS NULL OR branch_id = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at ASC, seq ASC
            "#,
            TRANSFER_COLUMNS
        ))
        .bind(query.batch_id)
        .bind(query.branch_id)
        .bind(query.created.start())
        .bind(query.created.end())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(BranchTransfer::from).collect())
    }

    async fn apply(&self, changes: ChangeSet) -> AppResult<ChangeReceipt> {
        let mut tx = self.db.begin().await?;
        let mut receipt = ChangeReceipt::default();

        for mutation in changes.into_mutations() {
            // dropping `tx` on error rolls the whole change set back
            Self::apply_mutation(&mut *tx, mutation, &mut receipt).await?;
        }

        let committed_at: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        receipt.committed_at = Some(committed_at);
        Ok(receipt)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
