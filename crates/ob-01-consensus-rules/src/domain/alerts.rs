//! Administrative alerts.
//!
//! Alerts are broadcast by the authorized administrative source (or raised
//! internally by the activation gate) and carry an expiry condition. One
//! alert is kept per source; a newer alert from the same source replaces
//! the older one, and alert type 0 clears it.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Wire value that clears the sender's current alert.
pub const ALERT_TYPE_CLEAR: u16 = 0;

/// How an alert expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    /// Expires once the chain reaches the stored block height.
    BlockExpiry,
    /// Expires once block time reaches the stored unix timestamp.
    BlockTimeExpiry,
    /// Expires once the running client version reaches the stored value.
    ClientVersionExpiry,
}

impl AlertType {
    /// Resolves a wire value to an alert type.
    pub fn from_wire(value: u16) -> Option<Self> {
        match value {
            1 => Some(AlertType::BlockExpiry),
            2 => Some(AlertType::BlockTimeExpiry),
            3 => Some(AlertType::ClientVersionExpiry),
            _ => None,
        }
    }
}

/// A live administrative alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub source: Address,
    pub alert_type: AlertType,
    pub expiry: u64,
    pub message: String,
}

impl Alert {
    pub fn new(source: Address, alert_type: AlertType, expiry: u64, message: String) -> Self {
        Self {
            source,
            alert_type,
            expiry,
            message,
        }
    }

    /// Whether the alert has expired given the current chain view.
    pub fn is_expired(&self, block: u64, block_time: u64, client_version: u32) -> bool {
        match self.alert_type {
            AlertType::BlockExpiry => block >= self.expiry,
            AlertType::BlockTimeExpiry => block_time >= self.expiry,
            AlertType::ClientVersionExpiry => u64::from(client_version) >= self.expiry,
        }
    }
}
