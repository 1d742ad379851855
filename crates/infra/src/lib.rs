//! `stockbook-infra` — storage implementations and the ledger read side.
//!
//! The movement store is the append-only system of record; the ledger
//! aggregator derives monthly stock views from it on demand. Both an
//! in-memory store (dev/test) and a Postgres store (production) implement
//! the same capability traits, so everything above them is substitutable.

pub mod catalog;
pub mod ledger;
pub mod movement_store;


pub use catalog::ProductCatalog;
pub use ledger::{
    FilterKey, FilterPredicate, LedgerAggregator, LedgerError, LedgerRequest, LedgerRow,
    StockTotalRow,
};
pub use movement_store::{InMemoryMovementStore, MovementRecord, MovementStore, PostgresMovementStore, StoreError};
