//! Error types for the MetaDEx subsystem.

use ob_02_balance_ledger::LedgerError;
use shared_types::{Address, PropertyId};
use thiserror::Error;

/// All errors that can occur on the distributed exchange.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetaDexError {
    /// Order amounts must be strictly positive
    #[error("Invalid order amount {0}")]
    InvalidAmount(i64),

    /// Orders cannot trade a property against itself
    #[error("Cannot trade property {0} against itself")]
    SameProperty(PropertyId),

    /// A cancellation matched no resting orders of the sender
    #[error("No open orders of {address} matched the cancellation scope")]
    NoOrdersToCancel { address: Address },

    /// Balance bookkeeping failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
