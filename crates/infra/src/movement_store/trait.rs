use std::sync::Arc;

use thiserror::Error;

use stockbook_core::{MovementId, ProductId, StorageFacilityId, TimeWindow};
use stockbook_inventory::{MovementAction, MovementDraft, StockMovement};

use crate::ledger::FilterPredicate;

/// One movement as seen by the aggregation read path.
///
/// A record is the movement joined against the product catalog:
/// `product_name` is the catalog name when the product is known there,
/// falling back to the movement's own denormalized name otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRecord {
    pub product_id: ProductId,
    pub product_name: String,
    pub storage_facility_id: Option<StorageFacilityId>,
    pub action: MovementAction,
    pub quantity: i64,
}

/// Movement store operation error.
///
/// These are **infrastructure errors** (storage, connectivity, corrupt
/// rows) as opposed to domain errors. A failed read is surfaced whole,
/// never as partial results.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The draft violated a write-time invariant (e.g. negative quantity).
    #[error("invalid append: {0}")]
    InvalidAppend(String),

    /// The underlying store could not execute the operation.
    #[error("query execution failed: {0}")]
    Query(String),

    /// The store is unreachable or its state is unusable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A persisted row could not be decoded (e.g. unknown action literal).
    #[error("malformed row: {0}")]
    MalformedRow(String),
}

/// Append-only stock-movement store.
///
/// The log is the system of record for physical stock changes. Movements
/// are immutable once written: there is deliberately no update or delete
/// operation, and corrections are made by appending compensating
/// movements.
///
/// `query_movements` is the only capability the ledger aggregation needs:
/// the window bounds the dates, and the predicates (already validated
/// against the closed filter set) restrict the join. Implementations must
/// apply predicates with SQL `LEFT JOIN` null semantics: a catalog-side
/// predicate excludes movements whose product is absent from the catalog.
pub trait MovementStore: Send + Sync {
    /// Persist a movement, assigning its id.
    ///
    /// Enforces the write-time sign invariant: drafts with a negative
    /// quantity are rejected with [`StoreError::InvalidAppend`].
    fn append(&self, draft: MovementDraft) -> Result<StockMovement, StoreError>;

    /// Movements within `window` matching every predicate, joined against
    /// the product catalog.
    fn query_movements(
        &self,
        window: TimeWindow,
        predicates: &[FilterPredicate],
    ) -> Result<Vec<MovementRecord>, StoreError>;

    /// The full log, in recording order.
    fn list_movements(&self) -> Result<Vec<StockMovement>, StoreError>;

    /// One movement by id.
    fn get_movement(&self, id: MovementId) -> Result<Option<StockMovement>, StoreError>;
}

impl<S> MovementStore for &S
where
    S: MovementStore + ?Sized,
{
    fn append(&self, draft: MovementDraft) -> Result<StockMovement, StoreError> {
        (**self).append(draft)
    }

    fn query_movements(
        &self,
        window: TimeWindow,
        predicates: &[FilterPredicate],
    ) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).query_movements(window, predicates)
    }

    fn list_movements(&self) -> Result<Vec<StockMovement>, StoreError> {
        (**self).list_movements()
    }

    fn get_movement(&self, id: MovementId) -> Result<Option<StockMovement>, StoreError> {
        (**self).get_movement(id)
    }
}

impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn append(&self, draft: MovementDraft) -> Result<StockMovement, StoreError> {
        (**self).append(draft)
    }

    fn query_movements(
        &self,
        window: TimeWindow,
        predicates: &[FilterPredicate],
    ) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).query_movements(window, predicates)
    }

    fn list_movements(&self) -> Result<Vec<StockMovement>, StoreError> {
        (**self).list_movements()
    }

    fn get_movement(&self, id: MovementId) -> Result<Option<StockMovement>, StoreError> {
        (**self).get_movement(id)
    }
}
