//! Error types for the balance ledger subsystem.

use super::entities::BalanceBucket;
use shared_types::{Address, PropertyId};
use thiserror::Error;

/// All errors that can occur while mutating ledger or registry state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Negative amount handed to a ledger operation
    #[error("Invalid amount {0}: amounts must be non-negative")]
    InvalidAmount(i64),

    /// Debit exceeds the bucket balance; nothing was changed
    #[error("Insufficient {bucket} balance for {address} on property {property}: needed {needed}, have {held}")]
    InsufficientBalance {
        address: Address,
        property: PropertyId,
        bucket: BalanceBucket,
        needed: i64,
        held: i64,
    },

    /// Credit would push a bucket past the token cap
    #[error("Balance overflow for {address} on property {property}")]
    BalanceOverflow {
        address: Address,
        property: PropertyId,
    },

    /// Property id is not registered
    #[error("Property {0} does not exist")]
    PropertyNotFound(PropertyId),

    /// Operation requires a managed property
    #[error("Property {0} is not managed")]
    NotManaged(PropertyId),

    /// Operation is reserved for the property issuer
    #[error("Sender {sender} is not the issuer of property {property}")]
    NotIssuer {
        property: PropertyId,
        sender: Address,
    },

    /// Supply adjustment would leave the property over the cap or negative
    #[error("Supply adjustment out of range for property {0}")]
    SupplyOutOfRange(PropertyId),

    /// Freezing is not enabled for the property
    #[error("Freezing is not enabled for property {0}")]
    FreezingNotEnabled(PropertyId),

    /// Freezing is already enabled for the property
    #[error("Freezing is already enabled for property {0}")]
    FreezingAlreadyEnabled(PropertyId),

    /// Address is already frozen for the property
    #[error("Address {address} is already frozen for property {property}")]
    AlreadyFrozen {
        property: PropertyId,
        address: Address,
    },

    /// Address is not frozen for the property
    #[error("Address {address} is not frozen for property {property}")]
    NotFrozen {
        property: PropertyId,
        address: Address,
    },

    /// Sender's balance for the property is frozen
    #[error("Address {address} is frozen for property {property}")]
    SenderFrozen {
        property: PropertyId,
        address: Address,
    },
}
