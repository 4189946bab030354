//! Error taxonomy of the state engine.
//!
//! `ProcessingError` covers per-transaction failures: local, non-fatal,
//! with no state mutated for the failing transaction. `ConsensusError`
//! covers the conditions under which the node must stop advancing.

use ob_01_consensus_rules::{Feature, RulesError};
use ob_02_balance_ledger::LedgerError;
use ob_03_dex::DexError;
use ob_04_metadex::MetaDexError;
use ob_05_crowdsale::CrowdsaleError;
use ob_06_fee_cache::FeeError;
use shared_types::PropertyId;
use thiserror::Error;

/// Why a single transaction was rejected. Block processing continues with
/// the next transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessingError {
    /// Transaction type/version not activated at this block
    #[error("Transaction type {tx_type} version {version} is not enabled at block {block}")]
    TypeNotAllowed {
        tx_type: u16,
        version: u16,
        block: u64,
    },

    /// Amounts must be strictly positive
    #[error("Invalid amount {0}")]
    InvalidAmount(i64),

    /// Property name must be non-empty
    #[error("Property name must not be empty")]
    EmptyPropertyName,

    /// Both properties of a pair must share an ecosystem
    #[error("Properties {0} and {1} are in different ecosystems")]
    CrossEcosystem(PropertyId, PropertyId),

    /// Until trade-all-pairs activates, one side must be the native token
    #[error("Pair ({0}, {1}) must include the native token")]
    NonNativePair(PropertyId, PropertyId),

    /// Send-to-owners found no qualifying recipient
    #[error("No qualifying owners to distribute property {0} to")]
    NoOwners(PropertyId),

    /// Send-all found nothing to move
    #[error("Sender holds no transferable tokens in the ecosystem")]
    NothingToTransfer,

    /// Accept transaction paid less than the offer's minimum fee
    #[error("Transaction fee {paid} below the offer minimum {required}")]
    FeeBelowMinimum { paid: i64, required: i64 },

    /// Freeze attempted before the notice waiting period elapsed
    #[error("Freezing for property {property} is not permitted until block {until}")]
    FreezeWaitActive { property: PropertyId, until: u64 },

    /// Crowdsale deadline must lie in the future
    #[error("Crowdsale deadline {0} is not in the future")]
    DeadlineInPast(i64),

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Dex(#[from] DexError),

    #[error(transparent)]
    MetaDex(#[from] MetaDexError),

    #[error(transparent)]
    Crowdsale(#[from] CrowdsaleError),

    #[error(transparent)]
    Fee(#[from] FeeError),
}

/// Fatal conditions: the node must halt rather than risk forking silently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsensusError {
    /// Checkpoint comparison failed: derived state diverged
    #[error("Consensus divergence: {0}")]
    Divergence(RulesError),

    /// An activated feature is not implemented by this client
    #[error("Feature {0:?} is live but not supported by this client")]
    UnsupportedFeature(Feature),

    /// Derived state failed an internal consistency check
    #[error("Internal state inconsistency: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_error_display() {
        let err = ProcessingError::TypeNotAllowed {
            tx_type: 25,
            version: 0,
            block: 7,
        };
        assert_eq!(
            err.to_string(),
            "Transaction type 25 version 0 is not enabled at block 7"
        );
    }

    #[test]
    fn test_subsystem_errors_convert() {
        let ledger_err = LedgerError::PropertyNotFound(9);
        let processing: ProcessingError = ledger_err.into();
        assert_eq!(processing.to_string(), "Property 9 does not exist");
    }
}
