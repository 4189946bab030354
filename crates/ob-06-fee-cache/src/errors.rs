//! Error types for the fee cache subsystem.

use shared_types::PropertyId;
use thiserror::Error;

/// All errors that can occur in fee accounting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeError {
    /// Fee amounts must be non-negative
    #[error("Invalid fee amount {0}")]
    InvalidAmount(i64),

    /// Cache total would exceed the token cap
    #[error("Fee cache overflow for property {0}")]
    CacheOverflow(PropertyId),
}
