//! Error types for the consensus rules subsystem.

use shared_types::TxHash;
use thiserror::Error;

/// All errors that can occur while applying or checking consensus rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    /// Feature id is not part of the closed feature set
    #[error("Unknown feature id {0}")]
    UnknownFeature(u16),

    /// Requested activation height violates the notice period
    #[error("Activation block {requested} outside notice window [{min}, {max}]")]
    ActivationOutsideNoticeWindow {
        requested: u64,
        min: u64,
        max: u64,
    },

    /// Feature is already live at the transaction block
    #[error("Feature {0} is already active")]
    FeatureAlreadyActive(u16),

    /// Deactivation of a feature that is not live
    #[error("Feature {0} is not active")]
    FeatureNotActive(u16),

    /// Sender is not an authorized administrative source for this network
    #[error("Sender {0} is not authorized for administrative transactions")]
    UnauthorizedSender(String),

    /// Alert wire value does not name a known expiry discipline
    #[error("Unknown alert type {0}")]
    InvalidAlertType(u16),

    /// Hardcoded checkpoint names a different anchor block at this height
    #[error("Block hash mismatch at checkpoint height {height}: expected {expected}, got {actual}")]
    CheckpointBlockHashMismatch {
        height: u64,
        expected: String,
        actual: String,
    },

    /// Derived state diverged from the hardcoded consensus hash
    #[error("Consensus hash mismatch at checkpoint height {height}: expected {expected}, got {actual}")]
    CheckpointConsensusHashMismatch {
        height: u64,
        expected: String,
        actual: String,
    },

    /// A checkpointed historical transaction is missing from processed state
    #[error("Historical transaction {txid} from block {height} not found")]
    MissingCheckpointTransaction { height: u64, txid: TxHash },
}
