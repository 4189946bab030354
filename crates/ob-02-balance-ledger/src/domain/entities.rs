//! Balance entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three independent quantities a balance entry tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceBucket {
    /// Spendable.
    Available,
    /// Locked by an open sell offer, accept or resting order.
    Reserved,
    /// Administratively locked by the issuer of a managed property.
    Frozen,
}

impl fmt::Display for BalanceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceBucket::Available => f.write_str("available"),
            BalanceBucket::Reserved => f.write_str("reserved"),
            BalanceBucket::Frozen => f.write_str("frozen"),
        }
    }
}

/// One address's holdings of one property.
///
/// Buckets are individually non-negative; their sum is the address's total
/// holding of the property and never exceeds the issued supply while the
/// conservation law holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub available: i64,
    pub reserved: i64,
    pub frozen: i64,
}

impl Tally {
    pub fn bucket(&self, bucket: BalanceBucket) -> i64 {
        match bucket {
            BalanceBucket::Available => self.available,
            BalanceBucket::Reserved => self.reserved,
            BalanceBucket::Frozen => self.frozen,
        }
    }

    pub(crate) fn bucket_mut(&mut self, bucket: BalanceBucket) -> &mut i64 {
        match bucket {
            BalanceBucket::Available => &mut self.available,
            BalanceBucket::Reserved => &mut self.reserved,
            BalanceBucket::Frozen => &mut self.frozen,
        }
    }

    /// Total units held across all buckets.
    pub fn total(&self) -> i64 {
        self.available + self.reserved + self.frozen
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
