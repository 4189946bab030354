//! The order book and the matching loop.

use crate::domain::entities::{BookKey, MetaDexOrder, PriceKey, TradeMatch};
use crate::domain::errors::MetaDexError;
use ob_02_balance_ledger::{BalanceBucket, BalanceLedger};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Ecosystem, PropertyId};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A (for-sale, desired) market side.
type Pair = (PropertyId, PropertyId);

/// Outcome of processing one incoming trade order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResult {
    pub matches: Vec<TradeMatch>,
    /// Remaining for-sale amount left resting on the book, zero if the
    /// order filled completely.
    pub amount_rested: i64,
    /// Trade fee withheld from the taker, in the desired property.
    pub fee_collected: i64,
}

/// The multi-pair order book.
///
/// Orders rest on the side selling `pair.0` for `pair.1`; an incoming
/// order for (P1, P2) therefore walks the (P2, P1) side. Within a side,
/// `BookKey` order is execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDexBook {
    sides: BTreeMap<Pair, BTreeMap<BookKey, MetaDexOrder>>,
}

impl MetaDexBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes an incoming trade order: reserves the for-sale amount,
    /// fills against acceptable resting orders of the opposite side at the
    /// resting orders' prices, and rests any remainder.
    ///
    /// `round_up` selects the maker-side fill math (ceiling when the
    /// integer math update is active). `fee_divisor`, when set, withholds
    /// `taker_received / fee_divisor` from each fill for the fee cache.
    pub fn trade(
        &mut self,
        ledger: &mut BalanceLedger,
        mut order: MetaDexOrder,
        round_up: bool,
        fee_divisor: Option<i64>,
    ) -> Result<TradeResult, MetaDexError> {
        if order.amount_for_sale <= 0 {
            return Err(MetaDexError::InvalidAmount(order.amount_for_sale));
        }
        if order.amount_desired <= 0 {
            return Err(MetaDexError::InvalidAmount(order.amount_desired));
        }
        if order.property_for_sale == order.property_desired {
            return Err(MetaDexError::SameProperty(order.property_for_sale));
        }

        ledger.move_between(
            &order.address,
            order.property_for_sale,
            BalanceBucket::Available,
            BalanceBucket::Reserved,
            order.amount_for_sale,
        )?;
        order.amount_remaining = order.amount_for_sale;

        let taker_gives = order.property_for_sale;
        let taker_gets = order.property_desired;
        let opposite: Pair = (taker_gets, taker_gives);

        let mut matches = Vec::new();
        let mut fee_collected = 0i64;

        while order.amount_remaining > 0 {
            let Some(maker_key) = self.best_key(&opposite) else {
                break;
            };
            let Some(maker) = self.sides.get_mut(&opposite).and_then(|s| s.get_mut(&maker_key))
            else {
                break;
            };

            // the side is price-sorted, so the first unacceptable price
            // ends the walk
            if !order.matches_price_of(maker) {
                break;
            }

            // what the maker still wants, in the taker's for-sale property
            let maker_wants = maker.amount_to_fill(round_up);

            let (taker_pays, taker_receives, maker_filled) = if maker_wants == 0 {
                // remaining amount too small to buy a single unit; close
                // the maker out and release its dust
                (0, 0, true)
            } else if order.amount_remaining >= maker_wants {
                (maker_wants, maker.amount_remaining, true)
            } else {
                let receives = ((order.amount_remaining as i128)
                    * (maker.amount_for_sale as i128)
                    / (maker.amount_desired as i128)) as i64;
                if receives == 0 {
                    // taker's remainder cannot buy a whole unit at the best
                    // price; it rests
                    break;
                }
                (order.amount_remaining, receives, false)
            };

            let maker_address = maker.address.clone();
            let maker_txid = maker.txid;

            if maker_filled {
                let released = maker.amount_remaining - taker_receives;
                maker.amount_remaining = 0;
                self.remove(&opposite, &maker_key);
                if released > 0 {
                    // unsellable dust goes back to the maker
                    ledger.move_between(
                        &maker_address,
                        taker_gets,
                        BalanceBucket::Reserved,
                        BalanceBucket::Available,
                        released,
                    )?;
                }
            } else {
                maker.amount_remaining -= taker_receives;
            }

            if taker_pays == 0 {
                continue;
            }

            // settle at the maker's price
            ledger.debit(
                &order.address,
                taker_gives,
                BalanceBucket::Reserved,
                taker_pays,
            )?;
            ledger.credit(
                &maker_address,
                taker_gives,
                BalanceBucket::Available,
                taker_pays,
            )?;

            ledger.debit(
                &maker_address,
                taker_gets,
                BalanceBucket::Reserved,
                taker_receives,
            )?;
            let fee = fee_divisor.map_or(0, |divisor| taker_receives / divisor);
            ledger.credit(
                &order.address,
                taker_gets,
                BalanceBucket::Available,
                taker_receives - fee,
            )?;
            fee_collected += fee;

            order.amount_remaining -= taker_pays;

            debug!(
                taker = %order.address,
                maker = %maker_address,
                taker_pays,
                taker_receives,
                fee,
                "Trade executed"
            );
            matches.push(TradeMatch {
                maker_txid,
                maker_address,
                maker_received: taker_pays,
                taker_received: taker_receives,
            });
        }

        let amount_rested = order.amount_remaining;
        if amount_rested > 0 {
            info!(
                address = %order.address,
                property_for_sale = order.property_for_sale,
                property_desired = order.property_desired,
                amount_rested,
                "Order resting on book"
            );
            self.sides
                .entry((taker_gives, taker_gets))
                .or_default()
                .insert(order.book_key(), order);
        }

        Ok(TradeResult {
            matches,
            amount_rested,
            fee_collected,
        })
    }

    /// Cancels the sender's orders on (P1, P2) quoted at exactly the given
    /// price, releasing their reserved remainders.
    pub fn cancel_at_price(
        &mut self,
        ledger: &mut BalanceLedger,
        address: &Address,
        property_for_sale: PropertyId,
        amount_for_sale: i64,
        property_desired: PropertyId,
        amount_desired: i64,
    ) -> Result<i64, MetaDexError> {
        let price = PriceKey {
            amount_desired,
            amount_for_sale,
        };
        self.cancel_where(ledger, address, |pair, key| {
            *pair == (property_for_sale, property_desired) && key.price == price
        })
    }

    /// Cancels all of the sender's orders on (P1, P2) regardless of price.
    pub fn cancel_pair(
        &mut self,
        ledger: &mut BalanceLedger,
        address: &Address,
        property_for_sale: PropertyId,
        property_desired: PropertyId,
    ) -> Result<i64, MetaDexError> {
        self.cancel_where(ledger, address, |pair, _| {
            *pair == (property_for_sale, property_desired)
        })
    }

    /// Cancels all of the sender's orders across every pair of one
    /// ecosystem.
    pub fn cancel_ecosystem(
        &mut self,
        ledger: &mut BalanceLedger,
        address: &Address,
        ecosystem: Ecosystem,
    ) -> Result<i64, MetaDexError> {
        self.cancel_where(ledger, address, |pair, _| {
            Ecosystem::of(pair.0) == ecosystem && Ecosystem::of(pair.1) == ecosystem
        })
    }

    fn cancel_where<F>(
        &mut self,
        ledger: &mut BalanceLedger,
        address: &Address,
        scope: F,
    ) -> Result<i64, MetaDexError>
    where
        F: Fn(&Pair, &BookKey) -> bool,
    {
        let mut targets: Vec<(Pair, BookKey)> = Vec::new();
        for (pair, side) in &self.sides {
            for (key, order) in side {
                if &order.address == address && scope(pair, key) {
                    targets.push((*pair, *key));
                }
            }
        }

        if targets.is_empty() {
            return Err(MetaDexError::NoOrdersToCancel {
                address: address.clone(),
            });
        }

        let mut released_total = 0i64;
        for (pair, key) in targets {
            if let Some(order) = self.remove(&pair, &key) {
                ledger.move_between(
                    address,
                    order.property_for_sale,
                    BalanceBucket::Reserved,
                    BalanceBucket::Available,
                    order.amount_remaining,
                )?;
                released_total += order.amount_remaining;
                info!(
                    %address,
                    property_for_sale = order.property_for_sale,
                    property_desired = order.property_desired,
                    released = order.amount_remaining,
                    "Order cancelled"
                );
            }
        }

        Ok(released_total)
    }

    /// Resting orders selling `property_for_sale`, optionally restricted to
    /// one desired property, in execution order per side.
    pub fn order_book(
        &self,
        property_for_sale: PropertyId,
        property_desired: Option<PropertyId>,
    ) -> Vec<&MetaDexOrder> {
        self.sides
            .iter()
            .filter(|((for_sale, desired), _)| {
                *for_sale == property_for_sale
                    && property_desired.map_or(true, |p| *desired == p)
            })
            .flat_map(|(_, side)| side.values())
            .collect()
    }

    /// All resting orders of one address.
    pub fn orders_of(&self, address: &Address) -> Vec<&MetaDexOrder> {
        self.orders()
            .filter(|order| &order.address == address)
            .collect()
    }

    /// All resting orders in (pair, execution) order.
    pub fn orders(&self) -> impl Iterator<Item = &MetaDexOrder> {
        self.sides.values().flat_map(|side| side.values())
    }

    pub fn is_empty(&self) -> bool {
        self.sides.values().all(|side| side.is_empty())
    }

    fn best_key(&self, pair: &Pair) -> Option<BookKey> {
        self.sides
            .get(pair)
            .and_then(|side| side.keys().next().copied())
    }

    fn remove(&mut self, pair: &Pair, key: &BookKey) -> Option<MetaDexOrder> {
        let side = self.sides.get_mut(pair)?;
        let order = side.remove(key);
        if side.is_empty() {
            self.sides.remove(pair);
        }
        order
    }
}
