use std::collections::HashMap;
use std::sync::RwLock;

use stockbook_core::{MovementId, ProductId, TimeWindow};
use stockbook_inventory::{MovementDraft, ProductSummary, StockMovement};

use crate::catalog::ProductCatalog;
use crate::ledger::FilterPredicate;

use super::r#trait::{MovementRecord, MovementStore, StoreError};

/// In-memory movement log + catalog.
///
/// Intended for tests/dev. Filter semantics deliberately mirror the SQL
/// `LEFT JOIN`: a catalog-side predicate excludes movements whose product
/// has no catalog entry, while the record's name falls back to the
/// movement's own denormalized copy.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    movements: RwLock<Vec<StockMovement>>,
    catalog: RwLock<HashMap<ProductId, ProductSummary>>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a movement as-is, bypassing draft validation.
    ///
    /// Exists so tests can reproduce historical rows that violate the
    /// write-time sign invariant (the read side must survive them).
    #[cfg(test)]
    pub(crate) fn append_unchecked(&self, movement: StockMovement) {
        self.movements
            .write()
            .expect("movement log lock poisoned")
            .push(movement);
    }

    fn matches(
        movement: &StockMovement,
        catalog: &HashMap<ProductId, ProductSummary>,
        predicate: &FilterPredicate,
    ) -> bool {
        let entry = catalog.get(&movement.product_id);
        match predicate {
            FilterPredicate::ProductNameContains(needle) => {
                entry.is_some_and(|p| p.name.contains(needle))
            }
            FilterPredicate::ClassificationPrimaryEquals(value) => {
                entry.is_some_and(|p| p.classification_primary == *value)
            }
            FilterPredicate::ClassificationSecondaryEquals(value) => {
                entry.is_some_and(|p| p.classification_secondary.as_deref() == Some(value))
            }
            FilterPredicate::StorageFacilityEquals(facility) => {
                movement.storage_facility_id == Some(*facility)
            }
            FilterPredicate::LotNumberEquals(lot) => movement.lot_number == Some(*lot),
        }
    }
}

impl MovementStore for InMemoryMovementStore {
    fn append(&self, draft: MovementDraft) -> Result<StockMovement, StoreError> {
        draft
            .validate()
            .map_err(|e| StoreError::InvalidAppend(e.to_string()))?;

        let mut movements = self
            .movements
            .write()
            .map_err(|_| StoreError::Unavailable("movement log lock poisoned".to_string()))?;

        let movement = draft.into_movement(MovementId::new());
        movements.push(movement.clone());
        Ok(movement)
    }

    fn query_movements(
        &self,
        window: TimeWindow,
        predicates: &[FilterPredicate],
    ) -> Result<Vec<MovementRecord>, StoreError> {
        let movements = self
            .movements
            .read()
            .map_err(|_| StoreError::Unavailable("movement log lock poisoned".to_string()))?;
        let catalog = self
            .catalog
            .read()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))?;

        let records = movements
            .iter()
            .filter(|m| window.contains(m.occurred_at))
            .filter(|m| predicates.iter().all(|p| Self::matches(m, &catalog, p)))
            .map(|m| MovementRecord {
                product_id: m.product_id,
                product_name: catalog
                    .get(&m.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| m.product_name.clone()),
                storage_facility_id: m.storage_facility_id,
                action: m.action,
                quantity: m.quantity,
            })
            .collect();

        Ok(records)
    }

    fn list_movements(&self) -> Result<Vec<StockMovement>, StoreError> {
        let movements = self
            .movements
            .read()
            .map_err(|_| StoreError::Unavailable("movement log lock poisoned".to_string()))?;
        Ok(movements.clone())
    }

    fn get_movement(&self, id: MovementId) -> Result<Option<StockMovement>, StoreError> {
        let movements = self
            .movements
            .read()
            .map_err(|_| StoreError::Unavailable("movement log lock poisoned".to_string()))?;
        Ok(movements.iter().find(|m| m.id == id).cloned())
    }
}

impl ProductCatalog for InMemoryMovementStore {
    fn upsert(&self, product: ProductSummary) -> Result<(), StoreError> {
        let mut catalog = self
            .catalog
            .write()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))?;
        catalog.insert(product.id, product);
        Ok(())
    }

    fn get(&self, id: ProductId) -> Result<Option<ProductSummary>, StoreError> {
        let catalog = self
            .catalog
            .read()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))?;
        Ok(catalog.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<ProductSummary>, StoreError> {
        let catalog = self
            .catalog
            .read()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))?;
        let mut products: Vec<_> = catalog.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }
}
