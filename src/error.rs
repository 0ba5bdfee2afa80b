//! Error taxonomy for the scoring core
//!
//! Only `MissingPopulationTotal` is fatal for a run. The per-package variants
//! are contained by the profile builder and surface as warnings.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("popularity data has no `Total` row; cannot derive percentile thresholds")]
    MissingPopulationTotal,

    #[error("unknown lookup key '{0}': not a valid package name")]
    UnknownLookupKey(String),

    #[error("{adapter} unavailable for '{key}': {reason}")]
    AdapterUnavailable {
        adapter: &'static str,
        key: String,
        reason: String,
    },
}

pub type RiskResult<T> = Result<T, RiskError>;
