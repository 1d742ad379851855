use std::collections::BTreeMap;

use serde::Deserialize;

use stockbook_core::{LotNumber, StorageFacilityId};

use super::error::LedgerError;

/// A ledger request exactly as it arrives over the wire: a raw period
/// string plus a string-keyed filter map. Validation of both is the
/// aggregator's job, so malformed input is rejected in one place, before
/// any query is built.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerRequest {
    pub period: String,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl LedgerRequest {
    pub fn for_period(period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            filters: BTreeMap::new(),
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

/// The closed set of filterable attributes.
///
/// Filter keys never reach a query as text; they resolve through this enum
/// or the request is rejected. This is the fixed, reviewed key→column table
/// that replaces the original's caller-supplied column names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    ProductName,
    ClassificationPrimary,
    ClassificationSecondary,
    StorageFacility,
    LotNumber,
}

impl FilterKey {
    pub const ALL: [FilterKey; 5] = [
        FilterKey::ProductName,
        FilterKey::ClassificationPrimary,
        FilterKey::ClassificationSecondary,
        FilterKey::StorageFacility,
        FilterKey::LotNumber,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            FilterKey::ProductName => "product_name",
            FilterKey::ClassificationPrimary => "classification_primary",
            FilterKey::ClassificationSecondary => "classification_secondary",
            FilterKey::StorageFacility => "storage_facility_id",
            FilterKey::LotNumber => "lot_number",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.wire_name() == s)
    }
}

/// A validated filter: key plus typed match value.
///
/// `ProductName` matches by substring; everything else by equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPredicate {
    ProductNameContains(String),
    ClassificationPrimaryEquals(String),
    ClassificationSecondaryEquals(String),
    StorageFacilityEquals(StorageFacilityId),
    LotNumberEquals(LotNumber),
}

/// Resolve a wire filter map into typed predicates.
///
/// Unknown keys fail with `InvalidFilterKey`; numeric keys with
/// non-numeric values fail with `InvalidFilterValue`. Blank values are
/// skipped, matching the original UI's habit of submitting empty form
/// fields for untouched filters.
pub(super) fn resolve_filters(
    filters: &BTreeMap<String, String>,
) -> Result<Vec<FilterPredicate>, LedgerError> {
    let mut predicates = Vec::with_capacity(filters.len());

    for (key, value) in filters {
        let key = FilterKey::from_wire(key)
            .ok_or_else(|| LedgerError::InvalidFilterKey(key.clone()))?;

        if value.trim().is_empty() {
            continue;
        }

        let predicate = match key {
            FilterKey::ProductName => FilterPredicate::ProductNameContains(value.clone()),
            FilterKey::ClassificationPrimary => {
                FilterPredicate::ClassificationPrimaryEquals(value.clone())
            }
            FilterKey::ClassificationSecondary => {
                FilterPredicate::ClassificationSecondaryEquals(value.clone())
            }
            FilterKey::StorageFacility => FilterPredicate::StorageFacilityEquals(
                value
                    .parse()
                    .map_err(|_| LedgerError::InvalidFilterValue {
                        key: key.wire_name(),
                        value: value.clone(),
                    })?,
            ),
            FilterKey::LotNumber => FilterPredicate::LotNumberEquals(
                value
                    .parse()
                    .map_err(|_| LedgerError::InvalidFilterValue {
                        key: key.wire_name(),
                        value: value.clone(),
                    })?,
            ),
        };

        predicates.push(predicate);
    }

    Ok(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn known_keys_resolve_to_typed_predicates() {
        let resolved = resolve_filters(&filters(&[
            ("product_name", "Widget"),
            ("classification_primary", "Raw"),
            ("storage_facility_id", "3"),
            ("lot_number", "17"),
        ]))
        .unwrap();

        assert_eq!(resolved.len(), 4);
        assert!(resolved.contains(&FilterPredicate::ProductNameContains("Widget".into())));
        assert!(resolved.contains(&FilterPredicate::ClassificationPrimaryEquals("Raw".into())));
        assert!(resolved.contains(&FilterPredicate::StorageFacilityEquals(3.into())));
        assert!(resolved.contains(&FilterPredicate::LotNumberEquals(17.into())));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = resolve_filters(&filters(&[("product.unknown_column", "x")])).unwrap_err();
        match err {
            LedgerError::InvalidFilterKey(key) => assert_eq!(key, "product.unknown_column"),
            other => panic!("expected InvalidFilterKey, got {other:?}"),
        }
    }

    #[test]
    fn column_path_keys_from_the_old_api_are_rejected() {
        // The original accepted raw column paths like "p.name"; they are
        // not part of the fixed key set.
        assert!(resolve_filters(&filters(&[("p.name", "Widget")])).is_err());
        assert!(resolve_filters(&filters(&[("invl.lot_number", "1")])).is_err());
    }

    #[test]
    fn non_numeric_value_for_numeric_key_is_rejected() {
        let err = resolve_filters(&filters(&[("lot_number", "L1")])).unwrap_err();
        match err {
            LedgerError::InvalidFilterValue { key, value } => {
                assert_eq!(key, "lot_number");
                assert_eq!(value, "L1");
            }
            other => panic!("expected InvalidFilterValue, got {other:?}"),
        }
    }

    #[test]
    fn blank_values_are_skipped() {
        let resolved =
            resolve_filters(&filters(&[("product_name", ""), ("lot_number", "  ")])).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn every_key_round_trips_through_wire_names() {
        for key in FilterKey::ALL {
            assert_eq!(FilterKey::from_wire(key.wire_name()), Some(key));
        }
        assert_eq!(FilterKey::from_wire("created"), None);
    }
}
