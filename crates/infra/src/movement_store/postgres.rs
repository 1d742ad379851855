//! Postgres-backed movement store and product catalog.
//!
//! Sits on the legacy tables unchanged (migrations are out of scope):
//!
//! ```sql
//! inventory_logs(
//!     id UUID PRIMARY KEY,
//!     product_id BIGINT NOT NULL,
//!     product_name TEXT NOT NULL,
//!     storage_facility_id BIGINT,
//!     lot_number BIGINT,
//!     action TEXT NOT NULL,          -- legacy literals 入庫 / 出庫
//!     quantity BIGINT NOT NULL,
//!     occurred_at DATE NOT NULL
//! )
//! products(
//!     id BIGINT PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     classification_primary TEXT NOT NULL,
//!     classification_secondary TEXT
//! )
//! ```
//!
//! Every statement is a constant string; caller input only ever travels
//! through bound parameters. Optional filters use nullable bind slots
//! (`($n IS NULL OR col = $n)`) so the SQL text never varies with input.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use stockbook_core::{MovementId, ProductId, TimeWindow};
use stockbook_inventory::{MovementAction, MovementDraft, ProductSummary, StockMovement};

use crate::catalog::ProductCatalog;
use crate::ledger::FilterPredicate;

use super::r#trait::{MovementRecord, MovementStore, StoreError};

/// Postgres movement store.
///
/// The trait surface is synchronous; calls bridge onto the ambient tokio
/// runtime, so they must run on a blocking-friendly thread
/// (`spawn_blocking`), never on a runtime worker.
pub struct PostgresMovementStore {
    pool: Arc<PgPool>,
}

impl PostgresMovementStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn runtime_handle() -> Result<tokio::runtime::Handle, StoreError> {
    tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Unavailable("no tokio runtime available for store call".to_string())
    })
}

/// The closed filter set decomposed into one nullable bind per key.
#[derive(Debug, Default)]
struct FilterBinds {
    product_name: Option<String>,
    classification_primary: Option<String>,
    classification_secondary: Option<String>,
    storage_facility_id: Option<i64>,
    lot_number: Option<i64>,
}

impl FilterBinds {
    fn from_predicates(predicates: &[FilterPredicate]) -> Self {
        let mut binds = Self::default();
        for predicate in predicates {
            match predicate {
                FilterPredicate::ProductNameContains(v) => binds.product_name = Some(v.clone()),
                FilterPredicate::ClassificationPrimaryEquals(v) => {
                    binds.classification_primary = Some(v.clone())
                }
                FilterPredicate::ClassificationSecondaryEquals(v) => {
                    binds.classification_secondary = Some(v.clone())
                }
                FilterPredicate::StorageFacilityEquals(f) => {
                    binds.storage_facility_id = Some(f.as_i64())
                }
                FilterPredicate::LotNumberEquals(l) => binds.lot_number = Some(l.as_i64()),
            }
        }
        binds
    }
}

fn movement_from_row(row: &PgRow) -> Result<StockMovement, StoreError> {
    let malformed = |e: sqlx::Error| StoreError::MalformedRow(e.to_string());

    let action_text: String = row.try_get("action").map_err(malformed)?;
    let action = MovementAction::from_wire(&action_text).ok_or_else(|| {
        StoreError::MalformedRow(format!("unknown action literal '{action_text}'"))
    })?;

    Ok(StockMovement {
        id: MovementId::from_uuid(row.try_get::<Uuid, _>("id").map_err(malformed)?),
        product_id: ProductId::new(row.try_get("product_id").map_err(malformed)?),
        product_name: row.try_get("product_name").map_err(malformed)?,
        storage_facility_id: row
            .try_get::<Option<i64>, _>("storage_facility_id")
            .map_err(malformed)?
            .map(Into::into),
        lot_number: row
            .try_get::<Option<i64>, _>("lot_number")
            .map_err(malformed)?
            .map(Into::into),
        action,
        quantity: row.try_get("quantity").map_err(malformed)?,
        occurred_at: row.try_get("occurred_at").map_err(malformed)?,
    })
}

fn record_from_row(row: &PgRow) -> Result<MovementRecord, StoreError> {
    let malformed = |e: sqlx::Error| StoreError::MalformedRow(e.to_string());

    let action_text: String = row.try_get("action").map_err(malformed)?;
    let action = MovementAction::from_wire(&action_text).ok_or_else(|| {
        StoreError::MalformedRow(format!("unknown action literal '{action_text}'"))
    })?;

    let movement_name: String = row.try_get("movement_name").map_err(malformed)?;
    let catalog_name: Option<String> = row.try_get("catalog_name").map_err(malformed)?;

    Ok(MovementRecord {
        product_id: ProductId::new(row.try_get("product_id").map_err(malformed)?),
        product_name: catalog_name.unwrap_or(movement_name),
        storage_facility_id: row
            .try_get::<Option<i64>, _>("storage_facility_id")
            .map_err(malformed)?
            .map(Into::into),
        action,
        quantity: row.try_get("quantity").map_err(malformed)?,
    })
}

impl MovementStore for PostgresMovementStore {
    fn append(&self, draft: MovementDraft) -> Result<StockMovement, StoreError> {
        draft
            .validate()
            .map_err(|e| StoreError::InvalidAppend(e.to_string()))?;

        let handle = runtime_handle()?;
        let pool = self.pool.clone();
        let movement = draft.into_movement(MovementId::new());
        let to_insert = movement.clone();

        handle.block_on(async move {
            sqlx::query(
                r#"
                INSERT INTO inventory_logs (
                    id, product_id, product_name, storage_facility_id,
                    lot_number, action, quantity, occurred_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(*to_insert.id.as_uuid())
            .bind(to_insert.product_id.as_i64())
            .bind(&to_insert.product_name)
            .bind(to_insert.storage_facility_id.map(|f| f.as_i64()))
            .bind(to_insert.lot_number.map(|l| l.as_i64()))
            .bind(to_insert.action.wire_label())
            .bind(to_insert.quantity)
            .bind(to_insert.occurred_at)
            .execute(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
        })?;

        tracing::debug!(movement_id = %movement.id, "movement appended");
        Ok(movement)
    }

    fn query_movements(
        &self,
        window: TimeWindow,
        predicates: &[FilterPredicate],
    ) -> Result<Vec<MovementRecord>, StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();
        let binds = FilterBinds::from_predicates(predicates);

        let rows = handle.block_on(async move {
            sqlx::query(
                r#"
                SELECT
                    l.product_id,
                    l.product_name AS movement_name,
                    p.name AS catalog_name,
                    l.storage_facility_id,
                    l.action,
                    l.quantity
                FROM inventory_logs l
                LEFT JOIN products p ON p.id = l.product_id
                WHERE ($1::date IS NULL OR l.occurred_at >= $1)
                  AND ($2::date IS NULL OR l.occurred_at < $2)
                  AND ($3::text IS NULL OR p.name LIKE '%' || $3 || '%')
                  AND ($4::text IS NULL OR p.classification_primary = $4)
                  AND ($5::text IS NULL OR p.classification_secondary = $5)
                  AND ($6::bigint IS NULL OR l.storage_facility_id = $6)
                  AND ($7::bigint IS NULL OR l.lot_number = $7)
                ORDER BY l.occurred_at, l.id
                "#,
            )
            .bind(window.from)
            .bind(window.until)
            .bind(binds.product_name)
            .bind(binds.classification_primary)
            .bind(binds.classification_secondary)
            .bind(binds.storage_facility_id)
            .bind(binds.lot_number)
            .fetch_all(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
        })?;

        rows.iter().map(record_from_row).collect()
    }

    fn list_movements(&self) -> Result<Vec<StockMovement>, StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();

        let rows = handle.block_on(async move {
            sqlx::query(
                r#"
                SELECT id, product_id, product_name, storage_facility_id,
                       lot_number, action, quantity, occurred_at
                FROM inventory_logs
                ORDER BY id
                "#,
            )
            .fetch_all(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
        })?;

        rows.iter().map(movement_from_row).collect()
    }

    fn get_movement(&self, id: MovementId) -> Result<Option<StockMovement>, StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();
        let uuid = *id.as_uuid();

        let row = handle.block_on(async move {
            sqlx::query(
                r#"
                SELECT id, product_id, product_name, storage_facility_id,
                       lot_number, action, quantity, occurred_at
                FROM inventory_logs
                WHERE id = $1
                "#,
            )
            .bind(uuid)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
        })?;

        row.as_ref().map(movement_from_row).transpose()
    }
}

impl ProductCatalog for PostgresMovementStore {
    fn upsert(&self, product: ProductSummary) -> Result<(), StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();

        handle.block_on(async move {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, classification_primary, classification_secondary)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id)
                DO UPDATE SET
                    name = EXCLUDED.name,
                    classification_primary = EXCLUDED.classification_primary,
                    classification_secondary = EXCLUDED.classification_secondary
                "#,
            )
            .bind(product.id.as_i64())
            .bind(&product.name)
            .bind(&product.classification_primary)
            .bind(&product.classification_secondary)
            .execute(&*pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Query(e.to_string()))
        })
    }

    fn get(&self, id: ProductId) -> Result<Option<ProductSummary>, StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();

        let row = handle.block_on(async move {
            sqlx::query(
                r#"
                SELECT id, name, classification_primary, classification_secondary
                FROM products
                WHERE id = $1
                "#,
            )
            .bind(id.as_i64())
            .fetch_optional(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
        })?;

        row.as_ref().map(product_from_row).transpose()
    }

    fn list(&self) -> Result<Vec<ProductSummary>, StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();

        let rows = handle.block_on(async move {
            sqlx::query(
                r#"
                SELECT id, name, classification_primary, classification_secondary
                FROM products
                ORDER BY id
                "#,
            )
            .fetch_all(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
        })?;

        rows.iter().map(product_from_row).collect()
    }
}

fn product_from_row(row: &PgRow) -> Result<ProductSummary, StoreError> {
    let malformed = |e: sqlx::Error| StoreError::MalformedRow(e.to_string());

    Ok(ProductSummary {
        id: ProductId::new(row.try_get("id").map_err(malformed)?),
        name: row.try_get("name").map_err(malformed)?,
        classification_primary: row.try_get("classification_primary").map_err(malformed)?,
        classification_secondary: row
            .try_get("classification_secondary")
            .map_err(malformed)?,
    })
}
