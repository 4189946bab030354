//! # OB-03: DEx Subsystem
//!
//! The bilateral exchange: sell offers of a layer property against the
//! anchor coin, consumed by accepts with a block-measured payment window.
//!
//! Offers reserve the for-sale amount in the seller's balance; accepts
//! earmark part of an offer for a specific buyer and start the payment
//! clock. The actual payment is an anchor-chain coin transfer observed by
//! the chain layer and fed in through [`DexBook::pay`]. Unpaid earmarks
//! expire back to the seller's available balance.
//!
//! Prices are never stored: everything shown or settled derives from the
//! original offer amounts, so partial consumption cannot drift the rate.

pub mod book;
pub mod errors;

pub use book::{DexAccept, DexBook, DexSettlement, SellOffer};
pub use errors::DexError;
