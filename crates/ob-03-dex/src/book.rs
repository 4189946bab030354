//! Sell offers, accepts, and their bookkeeping against the balance ledger.

use crate::errors::DexError;
use ob_02_balance_ledger::{BalanceBucket, BalanceLedger};
use serde::{Deserialize, Serialize};
use shared_types::{Address, PropertyId, TxHash};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Floor of `amount * numerator / denominator` with a widened intermediate.
fn mul_div_floor(amount: i64, numerator: i64, denominator: i64) -> i64 {
    ((amount as i128) * (numerator as i128) / (denominator as i128)) as i64
}

/// Ceiling of `amount * numerator / denominator` with a widened intermediate.
fn mul_div_ceil(amount: i64, numerator: i64, denominator: i64) -> i64 {
    let product = (amount as i128) * (numerator as i128);
    ((product + (denominator as i128) - 1) / (denominator as i128)) as i64
}

/// An open sell offer against the anchor coin.
///
/// `amount_original` and `anchor_desired_original` fix the unit price for
/// the offer's whole lifetime; `amount_remaining` is the part not yet
/// earmarked by accepts. The remaining amount sits in the seller's Reserved
/// bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOffer {
    pub txid: TxHash,
    pub seller: Address,
    pub property: PropertyId,
    pub amount_original: i64,
    pub anchor_desired_original: i64,
    pub amount_remaining: i64,
    pub payment_window: u8,
    pub min_accept_fee: i64,
}

impl SellOffer {
    /// Anchor value still being asked for the remaining amount, derived
    /// from the original amounts.
    pub fn anchor_still_desired(&self) -> i64 {
        mul_div_floor(
            self.amount_remaining,
            self.anchor_desired_original,
            self.amount_original,
        )
    }
}

/// A buyer's earmark on part of an offer, with its payment clock.
///
/// Carries its own copy of the offer's original amounts so settlement stays
/// correct even if the offer is later updated or cancelled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexAccept {
    pub buyer: Address,
    pub seller: Address,
    pub property: PropertyId,
    pub amount_original: i64,
    pub amount_remaining: i64,
    pub accept_block: u64,
    pub payment_window: u8,
    pub offer_txid: TxHash,
    pub offer_amount_original: i64,
    pub anchor_desired_original: i64,
}

impl DexAccept {
    /// Last block at which payment still settles.
    pub fn expiry_block(&self) -> u64 {
        self.accept_block + u64::from(self.payment_window)
    }

    /// Anchor value that settles the remaining earmark in full.
    pub fn anchor_to_pay(&self) -> i64 {
        mul_div_ceil(
            self.amount_remaining,
            self.anchor_desired_original,
            self.offer_amount_original,
        )
    }
}

/// One tokens-purchased settlement produced by a payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexSettlement {
    pub property: PropertyId,
    pub amount_purchased: i64,
}

/// The bilateral order book: open offers and pending accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexBook {
    offers: BTreeMap<(Address, PropertyId), SellOffer>,
    accepts: BTreeMap<(Address, PropertyId, Address), DexAccept>,
}

impl DexBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts a new sell offer, reserving the for-sale amount.
    ///
    /// The reservation clamps to the seller's available balance, as the
    /// wire amount may exceed it; the original amounts still fix the price.
    pub fn post_offer(
        &mut self,
        ledger: &mut BalanceLedger,
        txid: TxHash,
        seller: &Address,
        property: PropertyId,
        amount_for_sale: i64,
        anchor_desired: i64,
        payment_window: u8,
        min_accept_fee: i64,
    ) -> Result<(), DexError> {
        if amount_for_sale <= 0 {
            return Err(DexError::InvalidAmount(amount_for_sale));
        }
        if anchor_desired <= 0 {
            return Err(DexError::InvalidAmount(anchor_desired));
        }

        let key = (seller.clone(), property);
        if self.offers.contains_key(&key) {
            return Err(DexError::OfferAlreadyExists {
                seller: seller.clone(),
                property,
            });
        }

        let available = ledger.get(seller, property).available;
        let reserve = amount_for_sale.min(available);
        ledger.move_between(
            seller,
            property,
            BalanceBucket::Available,
            BalanceBucket::Reserved,
            reserve,
        )?;

        info!(%seller, property, amount = reserve, "Sell offer posted");
        self.offers.insert(
            key,
            SellOffer {
                txid,
                seller: seller.clone(),
                property,
                amount_original: amount_for_sale,
                anchor_desired_original: anchor_desired,
                amount_remaining: reserve,
                payment_window,
                min_accept_fee,
            },
        );

        Ok(())
    }

    /// Replaces an open offer with new terms. The unaccepted remainder is
    /// released first; pending accepts keep their own settlement terms.
    #[allow(clippy::too_many_arguments)]
    pub fn update_offer(
        &mut self,
        ledger: &mut BalanceLedger,
        txid: TxHash,
        seller: &Address,
        property: PropertyId,
        amount_for_sale: i64,
        anchor_desired: i64,
        payment_window: u8,
        min_accept_fee: i64,
    ) -> Result<(), DexError> {
        self.cancel_offer(ledger, seller, property)?;
        self.post_offer(
            ledger,
            txid,
            seller,
            property,
            amount_for_sale,
            anchor_desired,
            payment_window,
            min_accept_fee,
        )
    }

    /// Cancels an open offer, returning the unaccepted remainder to the
    /// seller's available balance.
    pub fn cancel_offer(
        &mut self,
        ledger: &mut BalanceLedger,
        seller: &Address,
        property: PropertyId,
    ) -> Result<(), DexError> {
        let offer = self
            .offers
            .remove(&(seller.clone(), property))
            .ok_or_else(|| DexError::OfferNotFound {
                seller: seller.clone(),
                property,
            })?;

        ledger.move_between(
            seller,
            property,
            BalanceBucket::Reserved,
            BalanceBucket::Available,
            offer.amount_remaining,
        )?;

        info!(%seller, property, released = offer.amount_remaining, "Sell offer cancelled");
        Ok(())
    }

    /// Earmarks part of an offer for `buyer` and starts the payment clock.
    /// Returns the earmarked amount, which may be less than requested.
    pub fn accept_offer(
        &mut self,
        buyer: &Address,
        seller: &Address,
        property: PropertyId,
        amount: i64,
        block: u64,
    ) -> Result<i64, DexError> {
        if amount <= 0 {
            return Err(DexError::InvalidAmount(amount));
        }

        let accept_key = (seller.clone(), property, buyer.clone());
        if self.accepts.contains_key(&accept_key) {
            return Err(DexError::AcceptAlreadyPending {
                buyer: buyer.clone(),
            });
        }

        let offer = self
            .offers
            .get_mut(&(seller.clone(), property))
            .ok_or_else(|| DexError::OfferNotFound {
                seller: seller.clone(),
                property,
            })?;

        let earmarked = amount.min(offer.amount_remaining);
        if earmarked == 0 {
            return Err(DexError::OfferDepleted {
                seller: seller.clone(),
                property,
            });
        }
        offer.amount_remaining -= earmarked;

        debug!(%buyer, %seller, property, earmarked, "Offer accepted");
        self.accepts.insert(
            accept_key,
            DexAccept {
                buyer: buyer.clone(),
                seller: seller.clone(),
                property,
                amount_original: earmarked,
                amount_remaining: earmarked,
                accept_block: block,
                payment_window: offer.payment_window,
                offer_txid: offer.txid,
                offer_amount_original: offer.amount_original,
                anchor_desired_original: offer.anchor_desired_original,
            },
        );

        Ok(earmarked)
    }

    /// Settles an observed anchor-coin payment from `buyer` to `seller`
    /// against the buyer's pending accepts, lowest property id first.
    ///
    /// Tokens purchased derive from the accept's original offer amounts;
    /// the anchor value consumed per accept rounds up so a payment cannot
    /// be double-counted across accepts.
    pub fn pay(
        &mut self,
        ledger: &mut BalanceLedger,
        buyer: &Address,
        seller: &Address,
        amount_paid: i64,
    ) -> Result<Vec<DexSettlement>, DexError> {
        if amount_paid <= 0 {
            return Err(DexError::InvalidAmount(amount_paid));
        }

        let keys: Vec<_> = self
            .accepts
            .iter()
            .filter(|((s, _, b), _)| s == seller && b == buyer)
            .map(|(key, _)| key.clone())
            .collect();

        let mut remaining_paid = amount_paid;
        let mut settlements = Vec::new();

        for key in keys {
            if remaining_paid == 0 {
                break;
            }

            let accept = match self.accepts.get_mut(&key) {
                Some(accept) => accept,
                None => continue,
            };

            let purchasable = mul_div_floor(
                remaining_paid,
                accept.offer_amount_original,
                accept.anchor_desired_original,
            );
            let purchased = purchasable.min(accept.amount_remaining);
            if purchased == 0 {
                continue;
            }

            let anchor_used = mul_div_ceil(
                purchased,
                accept.anchor_desired_original,
                accept.offer_amount_original,
            );
            remaining_paid -= anchor_used.min(remaining_paid);

            accept.amount_remaining -= purchased;
            let property = accept.property;
            let done = accept.amount_remaining == 0;

            ledger.debit(seller, property, BalanceBucket::Reserved, purchased)?;
            ledger.credit(buyer, property, BalanceBucket::Available, purchased)?;

            info!(%buyer, %seller, property, purchased, "DEx payment settled");
            settlements.push(DexSettlement {
                property,
                amount_purchased: purchased,
            });

            if done {
                self.accepts.remove(&key);
            }
        }

        Ok(settlements)
    }

    /// Expires accepts whose payment window has elapsed, returning the
    /// unpaid earmarks to the sellers' available balances.
    pub fn expire_accepts(
        &mut self,
        ledger: &mut BalanceLedger,
        current_block: u64,
    ) -> Result<usize, DexError> {
        let expired: Vec<_> = self
            .accepts
            .iter()
            .filter(|(_, accept)| current_block >= accept.expiry_block())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired.len();
        for key in expired {
            if let Some(accept) = self.accepts.remove(&key) {
                ledger.move_between(
                    &accept.seller,
                    accept.property,
                    BalanceBucket::Reserved,
                    BalanceBucket::Available,
                    accept.amount_remaining,
                )?;
                info!(
                    buyer = %accept.buyer,
                    seller = %accept.seller,
                    property = accept.property,
                    released = accept.amount_remaining,
                    "Accept expired unpaid"
                );
            }
        }

        Ok(count)
    }

    /// An open offer, if any.
    pub fn offer(&self, seller: &Address, property: PropertyId) -> Option<&SellOffer> {
        self.offers.get(&(seller.clone(), property))
    }

    /// Open offers, optionally filtered by seller, in (seller, property)
    /// order.
    pub fn active_offers(&self, seller_filter: Option<&Address>) -> Vec<&SellOffer> {
        self.offers
            .values()
            .filter(|offer| seller_filter.map_or(true, |s| &offer.seller == s))
            .collect()
    }

    /// Pending accepts against one offer, in buyer order.
    pub fn accepts_of(&self, seller: &Address, property: PropertyId) -> Vec<&DexAccept> {
        self.accepts
            .values()
            .filter(|accept| &accept.seller == seller && accept.property == property)
            .collect()
    }

    /// All open offers in key order.
    pub fn offers(&self) -> impl Iterator<Item = &SellOffer> {
        self.offers.values()
    }

    /// All pending accepts in key order.
    pub fn accepts(&self) -> impl Iterator<Item = &DexAccept> {
        self.accepts.values()
    }
}
