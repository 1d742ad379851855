//! Product catalog capability.
//!
//! The catalog is owned by the surrounding ERP; this is the read/seed slice
//! the ledger join and classification filters need.

use std::sync::Arc;

use stockbook_core::ProductId;
use stockbook_inventory::ProductSummary;

use crate::movement_store::StoreError;

pub trait ProductCatalog: Send + Sync {
    /// Insert or replace one catalog entry.
    fn upsert(&self, product: ProductSummary) -> Result<(), StoreError>;

    /// One entry by product id.
    fn get(&self, id: ProductId) -> Result<Option<ProductSummary>, StoreError>;

    /// All entries, ascending product id.
    fn list(&self) -> Result<Vec<ProductSummary>, StoreError>;
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn upsert(&self, product: ProductSummary) -> Result<(), StoreError> {
        (**self).upsert(product)
    }

    fn get(&self, id: ProductId) -> Result<Option<ProductSummary>, StoreError> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<ProductSummary>, StoreError> {
        (**self).list()
    }
}
