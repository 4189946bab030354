//! The balance ledger map.
//!
//! Keys are (address, property); iteration order is the key order, which is
//! what makes consensus-hash folding deterministic without any extra sort.
//!
//! ## Invariants Enforced
//!
//! - Every bucket is always >= 0; a debit that would go negative fails and
//!   leaves all buckets unchanged.
//! - No bucket ever exceeds the token cap.
//! - Entries whose buckets all reach zero are pruned, so iteration only
//!   ever sees live holdings.

use super::entities::{BalanceBucket, Tally};
use super::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, PropertyId, MAX_TOKENS};
use std::collections::BTreeMap;
use tracing::trace;

/// All balances of all addresses, indexed by (address, property).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLedger {
    tallies: BTreeMap<(Address, PropertyId), Tally>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tally for an address and property; zero if none is recorded.
    pub fn get(&self, address: &Address, property: PropertyId) -> Tally {
        self.tallies
            .get(&(address.clone(), property))
            .copied()
            .unwrap_or_default()
    }

    /// Adds `amount` to one bucket.
    pub fn credit(
        &mut self,
        address: &Address,
        property: PropertyId,
        bucket: BalanceBucket,
        amount: i64,
    ) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        // zero credits are no-ops; they must not materialize empty entries
        if amount == 0 {
            return Ok(());
        }

        let tally = self
            .tallies
            .entry((address.clone(), property))
            .or_default();
        let slot = tally.bucket_mut(bucket);
        *slot = slot
            .checked_add(amount)
            .filter(|&v| v <= MAX_TOKENS)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                address: address.clone(),
                property,
            })?;

        trace!(%address, property, %bucket, amount, "credit");
        Ok(())
    }

    /// Removes `amount` from one bucket. Fails atomically if the bucket
    /// holds less than `amount`.
    pub fn debit(
        &mut self,
        address: &Address,
        property: PropertyId,
        bucket: BalanceBucket,
        amount: i64,
    ) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if amount == 0 {
            return Ok(());
        }

        let key = (address.clone(), property);
        let tally = self.tallies.get_mut(&key).ok_or_else(|| {
            LedgerError::InsufficientBalance {
                address: address.clone(),
                property,
                bucket,
                needed: amount,
                held: 0,
            }
        })?;

        let slot = tally.bucket_mut(bucket);
        if *slot < amount {
            return Err(LedgerError::InsufficientBalance {
                address: address.clone(),
                property,
                bucket,
                needed: amount,
                held: *slot,
            });
        }
        *slot -= amount;

        if tally.is_empty() {
            self.tallies.remove(&key);
        }

        trace!(%address, property, %bucket, amount, "debit");
        Ok(())
    }

    /// Moves `amount` between two buckets of the same entry.
    pub fn move_between(
        &mut self,
        address: &Address,
        property: PropertyId,
        from: BalanceBucket,
        to: BalanceBucket,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.debit(address, property, from, amount)?;
        self.credit(address, property, to, amount)
    }

    /// Moves `amount` of one property between the available buckets of two
    /// addresses, the primitive behind every transfer.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        property: PropertyId,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.debit(from, property, BalanceBucket::Available, amount)?;
        self.credit(to, property, BalanceBucket::Available, amount)
    }

    /// Addresses holding the property, with their spendable-plus-reserved
    /// weight, in address order. Frozen holdings do not qualify.
    pub fn owners_of(&self, property: PropertyId) -> Vec<(Address, i64)> {
        self.tallies
            .iter()
            .filter(|((_, p), _)| *p == property)
            .filter_map(|((address, _), tally)| {
                let weight = tally.available + tally.reserved;
                (weight > 0).then(|| (address.clone(), weight))
            })
            .collect()
    }

    /// The ordered set of property ids an address holds.
    pub fn properties_of(&self, address: &Address) -> Vec<PropertyId> {
        self.tallies
            .range((address.clone(), PropertyId::MIN)..=(address.clone(), PropertyId::MAX))
            .filter(|(_, tally)| !tally.is_empty())
            .map(|((_, property), _)| *property)
            .collect()
    }

    /// Sum of all buckets over all addresses for one property.
    pub fn total_of(&self, property: PropertyId) -> i64 {
        self.tallies
            .iter()
            .filter(|((_, p), _)| *p == property)
            .map(|(_, tally)| tally.total())
            .sum()
    }

    /// All live entries in (address, property) order.
    pub fn entries(&self) -> impl Iterator<Item = (&(Address, PropertyId), &Tally)> {
        self.tallies.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(name: &str) -> Address {
        Address::from(name)
    }

    #[test]
    fn test_credit_and_get() {
        let mut ledger = BalanceLedger::new();
        ledger
            .credit(&addr("oAlice"), 3, BalanceBucket::Available, 100)
            .expect("credit");

        assert_eq!(ledger.get(&addr("oAlice"), 3).available, 100);
        assert_eq!(ledger.get(&addr("oAlice"), 3).reserved, 0);
        assert_eq!(ledger.get(&addr("oBob"), 3).available, 0);
    }

    #[test]
    fn test_debit_insufficient_leaves_state_unchanged() {
        let mut ledger = BalanceLedger::new();
        ledger
            .credit(&addr("oAlice"), 3, BalanceBucket::Available, 50)
            .expect("credit");

        let err = ledger.debit(&addr("oAlice"), 3, BalanceBucket::Available, 51);
        assert!(matches!(
            err,
            Err(LedgerError::InsufficientBalance { held: 50, .. })
        ));
        assert_eq!(ledger.get(&addr("oAlice"), 3).available, 50);
    }

    #[test]
    fn test_debit_unknown_entry_fails() {
        let mut ledger = BalanceLedger::new();
        assert!(ledger
            .debit(&addr("oNobody"), 3, BalanceBucket::Available, 1)
            .is_err());
    }

    #[test]
    fn test_zero_amounts_are_no_ops() {
        let mut ledger = BalanceLedger::new();

        ledger
            .credit(&addr("oAlice"), 3, BalanceBucket::Available, 0)
            .expect("zero credit");
        ledger
            .debit(&addr("oAlice"), 3, BalanceBucket::Available, 0)
            .expect("zero debit");

        // neither materialized an entry
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut ledger = BalanceLedger::new();
        assert_eq!(
            ledger.credit(&addr("oAlice"), 3, BalanceBucket::Available, -1),
            Err(LedgerError::InvalidAmount(-1))
        );
        assert_eq!(
            ledger.debit(&addr("oAlice"), 3, BalanceBucket::Available, -1),
            Err(LedgerError::InvalidAmount(-1))
        );
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let mut ledger = BalanceLedger::new();
        ledger
            .credit(&addr("oAlice"), 3, BalanceBucket::Available, MAX_TOKENS)
            .expect("cap itself is fine");

        assert!(matches!(
            ledger.credit(&addr("oAlice"), 3, BalanceBucket::Available, 1),
            Err(LedgerError::BalanceOverflow { .. })
        ));
    }

    #[test]
    fn test_move_between_buckets() {
        let mut ledger = BalanceLedger::new();
        ledger
            .credit(&addr("oAlice"), 3, BalanceBucket::Available, 100)
            .expect("credit");
        ledger
            .move_between(
                &addr("oAlice"),
                3,
                BalanceBucket::Available,
                BalanceBucket::Reserved,
                60,
            )
            .expect("move");

        let tally = ledger.get(&addr("oAlice"), 3);
        assert_eq!(tally.available, 40);
        assert_eq!(tally.reserved, 60);
        assert_eq!(tally.total(), 100);
    }

    #[test]
    fn test_empty_entries_are_pruned() {
        let mut ledger = BalanceLedger::new();
        ledger
            .credit(&addr("oAlice"), 3, BalanceBucket::Available, 10)
            .expect("credit");
        ledger
            .debit(&addr("oAlice"), 3, BalanceBucket::Available, 10)
            .expect("debit");

        assert!(ledger.is_empty());
        assert_eq!(ledger.entries().count(), 0);
    }

    #[test]
    fn test_owners_of_excludes_frozen_and_sorts() {
        let mut ledger = BalanceLedger::new();
        ledger
            .credit(&addr("oCarol"), 3, BalanceBucket::Available, 5)
            .expect("credit");
        ledger
            .credit(&addr("oAlice"), 3, BalanceBucket::Reserved, 7)
            .expect("credit");
        ledger
            .credit(&addr("oBob"), 3, BalanceBucket::Frozen, 9)
            .expect("credit");
        ledger
            .credit(&addr("oDave"), 4, BalanceBucket::Available, 11)
            .expect("credit");

        let owners = ledger.owners_of(3);
        assert_eq!(owners, vec![(addr("oAlice"), 7), (addr("oCarol"), 5)]);
    }

    #[test]
    fn test_properties_of_is_ordered() {
        let mut ledger = BalanceLedger::new();
        for property in [7u32, 3, 5] {
            ledger
                .credit(&addr("oAlice"), property, BalanceBucket::Available, 1)
                .expect("credit");
        }
        ledger
            .credit(&addr("oBob"), 9, BalanceBucket::Available, 1)
            .expect("credit");

        assert_eq!(ledger.properties_of(&addr("oAlice")), vec![3, 5, 7]);
        assert_eq!(ledger.properties_of(&addr("oBob")), vec![9]);
    }

    proptest! {
        /// Any sequence of credits, debits and bucket moves keeps every
        /// bucket non-negative, and failed operations change nothing.
        #[test]
        fn prop_buckets_never_negative(ops in proptest::collection::vec(
            (0u8..3, 0u8..3, 0i64..1_000), 1..64
        )) {
            let mut ledger = BalanceLedger::new();
            let address = addr("oProp");
            let buckets = [
                BalanceBucket::Available,
                BalanceBucket::Reserved,
                BalanceBucket::Frozen,
            ];

            for (op, bucket_sel, amount) in ops {
                let bucket = buckets[bucket_sel as usize];
                match op {
                    0 => { let _ = ledger.credit(&address, 1, bucket, amount); }
                    1 => { let _ = ledger.debit(&address, 1, bucket, amount); }
                    _ => {
                        let to = buckets[((bucket_sel as usize) + 1) % 3];
                        let _ = ledger.move_between(&address, 1, bucket, to, amount);
                    }
                }

                let tally = ledger.get(&address, 1);
                prop_assert!(tally.available >= 0);
                prop_assert!(tally.reserved >= 0);
                prop_assert!(tally.frozen >= 0);
            }
        }

        /// Bucket moves conserve the total holding.
        #[test]
        fn prop_moves_conserve_total(seed in 0i64..1_000_000, moves in proptest::collection::vec((0u8..3, 0u8..3, 0i64..1_000), 0..32)) {
            let mut ledger = BalanceLedger::new();
            let address = addr("oProp");
            ledger.credit(&address, 1, BalanceBucket::Available, seed).expect("seed");
            let buckets = [
                BalanceBucket::Available,
                BalanceBucket::Reserved,
                BalanceBucket::Frozen,
            ];

            for (from, to, amount) in moves {
                let _ = ledger.move_between(
                    &address,
                    1,
                    buckets[from as usize],
                    buckets[to as usize],
                    amount,
                );
            }

            prop_assert_eq!(ledger.get(&address, 1).total(), seed);
        }
    }
}
