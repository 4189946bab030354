//! Error types for the DEx subsystem.

use ob_02_balance_ledger::LedgerError;
use shared_types::{Address, PropertyId};
use thiserror::Error;

/// All errors that can occur on the bilateral exchange.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DexError {
    /// Offer amounts must be strictly positive
    #[error("Invalid offer amount {0}")]
    InvalidAmount(i64),

    /// One open offer per (seller, property)
    #[error("Seller {seller} already has an open offer for property {property}")]
    OfferAlreadyExists {
        seller: Address,
        property: PropertyId,
    },

    /// No open offer to update, cancel or accept
    #[error("No open offer by {seller} for property {property}")]
    OfferNotFound {
        seller: Address,
        property: PropertyId,
    },

    /// Offer has no un-earmarked amount left to accept
    #[error("Offer by {seller} for property {property} is fully accepted")]
    OfferDepleted {
        seller: Address,
        property: PropertyId,
    },

    /// One pending accept per (seller, property, buyer)
    #[error("Buyer {buyer} already has a pending accept for this offer")]
    AcceptAlreadyPending { buyer: Address },

    /// Balance bookkeeping failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
