//! # OB-04: MetaDEx Subsystem
//!
//! The continuous double auction over arbitrary property pairs.
//!
//! ## Architecture
//!
//! - **Domain**: order entities and the rational price comparator
//! - **Book**: the order book with the matching loop and scoped cancels
//!
//! ## Determinism
//!
//! Prices are rationals compared exclusively by 128-bit integer
//! cross-multiplication; no floating point exists anywhere in this crate.
//! Within a price level orders fill strictly FIFO by (block, in-block
//! position), and trades always execute at the resting order's price.

pub mod book;
pub mod domain;

pub use book::{MetaDexBook, TradeResult};
pub use domain::entities::{BookKey, MetaDexOrder, PriceKey, TradeMatch};
pub use domain::errors::MetaDexError;
