use thiserror::Error;

use crate::movement_store::StoreError;

/// Ledger computation error.
///
/// The first three are client errors, raised before any store access; only
/// `DataAccess` originates below the aggregator. All are terminal for the
/// request; nothing here is retried or partially answered.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The period did not resolve to a real calendar month.
    #[error("invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    /// A filter key outside the fixed enumerated set.
    #[error("unknown filter key '{0}'")]
    InvalidFilterKey(String),

    /// A filter value that cannot be typed for its key.
    #[error("invalid value '{value}' for filter '{key}'")]
    InvalidFilterValue { key: &'static str, value: String },

    /// The movement store could not complete the read.
    #[error("movement store failed: {0}")]
    DataAccess(#[from] StoreError),
}
