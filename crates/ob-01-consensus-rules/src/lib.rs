//! # OB-01: Consensus Rules Subsystem
//!
//! Per-network consensus parameters and the feature activation gate.
//!
//! Everything height-dependent lives here: the transaction restriction
//! table, feature activation/deactivation with notice-period enforcement,
//! the alert registry, the hardcoded consensus and transaction checkpoints,
//! and the client version the activation gate compares against.
//!
//! ## Architecture
//!
//! - **Domain**: parameters, features, checkpoints, alerts, errors
//! - **Context**: `ConsensusContext`, the single mutable value owned by the
//!   engine through which all rule state is read and changed

pub mod context;
pub mod domain;
pub mod version;

pub use context::{CompletedActivation, ConsensusContext, PendingActivation};
pub use domain::alerts::{Alert, AlertType};
pub use domain::checkpoints::{ConsensusCheckpoint, TransactionCheckpoint, CHECKPOINT_INTERVAL};
pub use domain::errors::RulesError;
pub use domain::features::Feature;
pub use domain::params::{ConsensusParams, Network, TransactionRestriction, BLOCK_NEVER};
pub use version::{client_version, is_client_supported, version_string};
