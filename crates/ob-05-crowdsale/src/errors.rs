//! Error types for the crowdsale subsystem.

use shared_types::PropertyId;
use thiserror::Error;

/// All errors that can occur in crowdsale processing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrowdsaleError {
    /// Contribution amounts must be strictly positive
    #[error("Invalid contribution amount {0}")]
    InvalidAmount(i64),

    /// No active crowdsale for the property
    #[error("No active crowdsale for property {0}")]
    NotActive(PropertyId),

    /// A crowdsale for this property is already open
    #[error("Crowdsale for property {0} is already open")]
    AlreadyOpen(PropertyId),

    /// Crowdsale parameters are out of range
    #[error("Invalid crowdsale parameter: {0}")]
    InvalidParameter(&'static str),
}
