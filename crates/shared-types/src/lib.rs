//! # Shared Types Crate
//!
//! Cross-subsystem domain types for the Obol token layer: addresses,
//! property identifiers and ecosystems, amount constants, and the typed
//! transaction payload model handed to the state engine by the chain layer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary is
//!   defined here.
//! - **Deterministic Ordering**: `Address` orders lexicographically and all
//!   identifier types implement `Ord`, so any map keyed by them iterates in
//!   consensus order.
//! - **No Encoding**: binary payload decoding happens upstream; this crate
//!   only models the already-decoded shape.

pub mod entities;
pub mod payloads;

pub use entities::*;
pub use payloads::*;
