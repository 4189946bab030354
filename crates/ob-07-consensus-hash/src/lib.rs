//! # OB-07: Consensus Hash Subsystem
//!
//! Folds every piece of derived state (balances, both exchanges,
//! crowdsales, properties) into a single SHA-256 digest. Two nodes that
//! replayed the same chain produce the same digest; the checkpoint
//! verifier compares it against hardcoded anchors to catch divergence
//! early.
//!
//! Determinism comes from the data structures themselves: every source
//! iterates in key order, so the fold needs no extra sorting.

pub mod hasher;

pub use hasher::consensus_hash;
