use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockbook_core::{Period, ProductId, StorageFacilityId, TimeWindow};
use stockbook_inventory::MovementAction;

use crate::movement_store::{MovementRecord, MovementStore};

use super::error::LedgerError;
use super::query::{resolve_filters, LedgerRequest};

/// One product's line in the monthly ledger.
///
/// `closing_stock` is derived, never stored. Opening/closing may be
/// negative when history was inconsistent; the period sums never are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub opening_stock: i64,
    pub period_inbound: i64,
    pub period_outbound: i64,
    pub closing_stock: i64,
}

/// Net stock per (product, facility) over the whole log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTotalRow {
    pub product_id: ProductId,
    pub storage_facility_id: Option<StorageFacilityId>,
    pub net_quantity: i64,
}

/// Monthly inventory ledger aggregation.
///
/// A stateless, synchronous read over the injected movement store: every
/// invocation validates its input, issues window-bounded reads, and folds
/// them into a fresh result. It holds no locks, performs no retries, and
/// never logs; a store failure is surfaced whole as
/// [`LedgerError::DataAccess`], never as partial aggregates.
#[derive(Debug)]
pub struct LedgerAggregator<S> {
    store: S,
}

#[derive(Default)]
struct ProductAccumulator {
    name: Option<String>,
    opening: i64,
    inbound: i64,
    outbound: i64,
}

impl ProductAccumulator {
    fn note_name(&mut self, record: &MovementRecord) {
        if self.name.is_none() {
            self.name = Some(record.product_name.clone());
        }
    }
}

impl<S> LedgerAggregator<S>
where
    S: MovementStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Compute the ledger for one calendar month.
    ///
    /// Returns one row per distinct product with at least one movement
    /// matching the attribute filters, ascending product id. The month
    /// only windows the sums: a product whose matching movements all fall
    /// outside it still gets a row (all-zero when they all fall after).
    /// Zero matching movements overall is an empty result, not an error.
    pub fn compute_ledger(&self, request: &LedgerRequest) -> Result<Vec<LedgerRow>, LedgerError> {
        let period: Period = request
            .period
            .parse()
            .map_err(|_| LedgerError::InvalidPeriod(request.period.clone()))?;
        let predicates = resolve_filters(&request.filters)?;

        let mut products: BTreeMap<ProductId, ProductAccumulator> = BTreeMap::new();

        // Everything strictly before the month nets into opening stock.
        for record in self
            .store
            .query_movements(period.preceding_window(), &predicates)?
        {
            let acc = products.entry(record.product_id).or_default();
            acc.note_name(&record);
            acc.opening += record.action.sign() * record.quantity.saturating_abs();
        }

        // The month itself splits into inbound and outbound sums.
        for record in self.store.query_movements(period.window(), &predicates)? {
            let acc = products.entry(record.product_id).or_default();
            acc.note_name(&record);
            match record.action {
                MovementAction::Inbound => acc.inbound += record.quantity.saturating_abs(),
                MovementAction::Outbound => acc.outbound += record.quantity.saturating_abs(),
            }
        }

        // Movements after the month contribute nothing to the sums but
        // still make their product part of the answer.
        for record in self
            .store
            .query_movements(period.following_window(), &predicates)?
        {
            products.entry(record.product_id).or_default().note_name(&record);
        }

        let rows = products
            .into_iter()
            .map(|(product_id, acc)| LedgerRow {
                product_id,
                product_name: acc.name.unwrap_or_default(),
                opening_stock: acc.opening,
                period_inbound: acc.inbound,
                period_outbound: acc.outbound,
                closing_stock: acc.opening + acc.inbound - acc.outbound,
            })
            .collect();

        Ok(rows)
    }

    /// Net stock per (product, facility) across the whole log, ordered by
    /// product then facility.
    pub fn stock_totals(&self) -> Result<Vec<StockTotalRow>, LedgerError> {
        let mut totals: BTreeMap<(ProductId, Option<StorageFacilityId>), i64> = BTreeMap::new();

        for record in self.store.query_movements(TimeWindow::unbounded(), &[])? {
            let net = totals
                .entry((record.product_id, record.storage_facility_id))
                .or_insert(0);
            *net += record.action.sign() * record.quantity.saturating_abs();
        }

        Ok(totals
            .into_iter()
            .map(|((product_id, storage_facility_id), net_quantity)| StockTotalRow {
                product_id,
                storage_facility_id,
                net_quantity,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use stockbook_core::MovementId;
    use stockbook_inventory::{MovementDraft, StockMovement};

    use crate::ledger::FilterPredicate;
    use crate::movement_store::StoreError;

    use super::*;

    /// Store double that counts reads; used to prove invalid requests are
    /// rejected before any store access.
    #[derive(Default)]
    struct ProbeStore {
        queries: AtomicUsize,
    }

    impl MovementStore for ProbeStore {
        fn append(&self, _draft: MovementDraft) -> Result<StockMovement, StoreError> {
            unreachable!("aggregator never writes")
        }

        fn query_movements(
            &self,
            _window: TimeWindow,
            _predicates: &[FilterPredicate],
        ) -> Result<Vec<MovementRecord>, StoreError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        fn list_movements(&self) -> Result<Vec<StockMovement>, StoreError> {
            Ok(vec![])
        }

        fn get_movement(&self, _id: MovementId) -> Result<Option<StockMovement>, StoreError> {
            Ok(None)
        }
    }

    struct FailingStore;

    impl MovementStore for FailingStore {
        fn append(&self, _draft: MovementDraft) -> Result<StockMovement, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        fn query_movements(
            &self,
            _window: TimeWindow,
            _predicates: &[FilterPredicate],
        ) -> Result<Vec<MovementRecord>, StoreError> {
            Err(StoreError::Query("connection reset mid-query".into()))
        }

        fn list_movements(&self) -> Result<Vec<StockMovement>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        fn get_movement(&self, _id: MovementId) -> Result<Option<StockMovement>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[test]
    fn unknown_filter_key_never_reaches_the_store() {
        let store = ProbeStore::default();
        let aggregator = LedgerAggregator::new(&store);

        let request =
            LedgerRequest::for_period("2024-01").with_filter("product.unknown_column", "x");
        let err = aggregator.compute_ledger(&request).unwrap_err();

        assert!(matches!(err, LedgerError::InvalidFilterKey(_)));
        assert_eq!(store.queries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_period_never_reaches_the_store() {
        let store = ProbeStore::default();
        let aggregator = LedgerAggregator::new(&store);

        let err = aggregator
            .compute_ledger(&LedgerRequest::for_period("2024-2"))
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidPeriod(_)));
        assert_eq!(store.queries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_store_yields_empty_result() {
        let store = ProbeStore::default();
        let aggregator = LedgerAggregator::new(&store);

        let rows = aggregator
            .compute_ledger(&LedgerRequest::for_period("2024-01"))
            .unwrap();

        assert!(rows.is_empty());
        // One read per window: before, within, after.
        assert_eq!(store.queries.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn store_failure_surfaces_as_data_access() {
        let aggregator = LedgerAggregator::new(FailingStore);

        let err = aggregator
            .compute_ledger(&LedgerRequest::for_period("2024-01"))
            .unwrap_err();

        assert!(matches!(err, LedgerError::DataAccess(StoreError::Query(_))));
    }
}
