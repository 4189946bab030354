//! # OB-06: Fee Cache Subsystem
//!
//! Accumulates trade fees per property and distributes them pro-rata to
//! native-token holders once a property's cache crosses its distribution
//! threshold.
//!
//! Every share is integer floor division; the sub-share remainder stays in
//! the cache for the next round. No floating point is involved anywhere in
//! this crate: a percentage "fee share" is a presentation concern that has
//! no business near consensus state.

pub mod cache;
pub mod errors;

pub use cache::{distribution_threshold, FeeCache, FeeDistribution, FEE_THRESHOLD_DIVISOR};
pub use errors::FeeError;
