pub mod atm;
pub mod builder;
pub mod expiry;

use chrono::NaiveDate;
use thiserror::Error;

/// Failures from the snapshot pipeline. Only `NoMarketData` is fatal
/// for a run; the rest degrade individual fields to the 0 sentinel.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("provider returned an empty price history")]
    NoMarketData,

    #[error("provider's latest close is {latest}, expected {expected} (strict date match)")]
    StaleHistory {
        latest: NaiveDate,
        expected: NaiveDate,
    },

    #[error("only {found} monthly expiries available, need {need}")]
    InsufficientExpiries { found: usize, need: usize },
}
