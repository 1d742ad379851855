use serde::{Deserialize, Serialize};

use stockbook_core::ProductId;

/// Read-side slice of the product catalog.
///
/// The catalog itself is owned by the surrounding ERP; the ledger only needs
/// the name (for output) and the two classification levels (for filtering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub classification_primary: String,
    pub classification_secondary: Option<String>,
}
