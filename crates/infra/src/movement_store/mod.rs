//! Movement storage: the append-only log and its query capability.

mod in_memory;
mod postgres;
mod r#trait;

pub use in_memory::InMemoryMovementStore;
pub use postgres::PostgresMovementStore;
pub use r#trait::{MovementRecord, MovementStore, StoreError};
