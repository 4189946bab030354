//! Order entities and the rational price comparator.

use serde::{Deserialize, Serialize};
use shared_types::{Address, PropertyId, TxHash};
use std::cmp::Ordering;

/// A unit price expressed as the rational `amount_desired /
/// amount_for_sale`.
///
/// Implements `Ord` by 128-bit cross-multiplication, so `1/2` and `2/4`
/// compare equal and bucket at the same price level. Lower compares first:
/// the order asking the least per unit is the best candidate for the
/// opposite side.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PriceKey {
    pub amount_desired: i64,
    pub amount_for_sale: i64,
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = (self.amount_desired as i128) * (other.amount_for_sale as i128);
        let rhs = (other.amount_desired as i128) * (self.amount_for_sale as i128);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PriceKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriceKey {}

/// Execution-priority key of a resting order: best price first, then
/// oldest by (block, in-block position), with the transaction hash as the
/// final unique tie-breaker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookKey {
    pub price: PriceKey,
    pub block: u64,
    pub position: u32,
    pub txid: TxHash,
}

/// A resting or incoming MetaDEx order.
///
/// `amount_for_sale` and `amount_desired` are the original amounts and fix
/// the price; `amount_remaining` (in for-sale units) is what is left to
/// fill. The remaining amount sits in the owner's Reserved bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDexOrder {
    pub txid: TxHash,
    pub address: Address,
    pub property_for_sale: PropertyId,
    pub amount_for_sale: i64,
    pub property_desired: PropertyId,
    pub amount_desired: i64,
    pub amount_remaining: i64,
    pub block: u64,
    pub position: u32,
}

impl MetaDexOrder {
    /// The price this order quoted at creation.
    pub fn price(&self) -> PriceKey {
        PriceKey {
            amount_desired: self.amount_desired,
            amount_for_sale: self.amount_for_sale,
        }
    }

    /// The book key this order sorts under.
    pub fn book_key(&self) -> BookKey {
        BookKey {
            price: self.price(),
            block: self.block,
            position: self.position,
            txid: self.txid,
        }
    }

    /// Desired units still wanted for the remaining for-sale amount, at the
    /// order's own price. Ceiling division when the integer math update is
    /// active, floor otherwise.
    pub fn amount_to_fill(&self, round_up: bool) -> i64 {
        let product = (self.amount_remaining as i128) * (self.amount_desired as i128);
        let denominator = self.amount_for_sale as i128;
        let quotient = if round_up {
            (product + denominator - 1) / denominator
        } else {
            product / denominator
        };
        quotient as i64
    }

    /// Whether `willing` (a price on the opposite side, quoted in this
    /// order's for-sale property) meets this order's limit.
    ///
    /// `self` sells P1 desiring P2; `other` sells P2 desiring P1. A match
    /// requires `other` to give at least `amount_desired / amount_for_sale`
    /// of P2 per P1, i.e. `other.for_sale * self.for_sale >=`
    /// `self.desired * other.desired` after cross-multiplication.
    pub fn matches_price_of(&self, other: &MetaDexOrder) -> bool {
        let offered = (other.amount_for_sale as i128) * (self.amount_for_sale as i128);
        let wanted = (self.amount_desired as i128) * (other.amount_desired as i128);
        offered >= wanted
    }
}

/// One fill executed against a resting order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMatch {
    pub maker_txid: TxHash,
    pub maker_address: Address,
    /// Amount of the taker's for-sale property the maker received.
    pub maker_received: i64,
    /// Amount of the maker's for-sale property the taker received, before
    /// any trade fee.
    pub taker_received: i64,
}
