//! `stockbook-inventory` — the inventory bounded context.
//!
//! Stock movements (the append-only log) and the product-catalog slice the
//! ledger joins against.

pub mod movement;
pub mod product;

pub use movement::{MovementAction, MovementDraft, StockMovement};
pub use product::ProductSummary;
