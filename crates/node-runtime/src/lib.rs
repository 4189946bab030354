//! # Node Runtime
//!
//! Wires every subsystem into the single consensus state engine the chain
//! layer drives.
//!
//! ## Architecture
//!
//! - **Engine**: all derived state plus the mutation entry points
//!   (`apply_transaction`, `apply_dex_payment`, `end_block`)
//! - **Handlers**: one handler per transaction type, behind the feature
//!   activation gate
//! - **Handle**: the single-writer lock around the engine for concurrent
//!   snapshot readers
//!
//! ## Concurrency model
//!
//! Block processing is strictly sequential: transaction N+1 may depend on
//! transaction N's effects, so nothing inside a block is ever parallel.
//! Readers take consistent snapshots through the shared handle's read lock
//! and never block the writer for longer than the read takes.

pub mod config;
pub mod engine;
pub mod errors;
pub mod handle;
pub mod handlers;

pub use config::EngineConfig;
pub use engine::{BlockSummary, StateEngine};
pub use errors::{ConsensusError, ProcessingError};
pub use handle::SharedEngine;
