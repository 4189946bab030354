//! Fee accumulation and pro-rata distribution records.

use crate::errors::FeeError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, PropertyId, MAX_TOKENS};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Denominator of the distribution threshold: a cache distributes once it
/// reaches 0.001% of the property's total supply (at least one unit).
pub const FEE_THRESHOLD_DIVISOR: i64 = 100_000;

/// Fee units required in the cache before a distribution triggers.
pub fn distribution_threshold(total_supply: i64) -> i64 {
    (total_supply / FEE_THRESHOLD_DIVISOR).max(1)
}

/// An immutable record of one completed fee distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDistribution {
    pub id: u64,
    pub property: PropertyId,
    pub block: u64,
    /// Cache total at trigger time; `recipients` sums to at most this.
    pub total: i64,
    pub recipients: Vec<(Address, i64)>,
}

impl FeeDistribution {
    pub fn distributed(&self) -> i64 {
        self.recipients.iter().map(|(_, amount)| amount).sum()
    }
}

/// Per-property collected fees and the distribution history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCache {
    cache: BTreeMap<PropertyId, i64>,
    distributions: Vec<FeeDistribution>,
    next_id: u64,
}

impl FeeCache {
    pub fn new() -> Self {
        Self {
            cache: BTreeMap::new(),
            distributions: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds collected fee units for a property, returning the new total.
    pub fn add_fee(&mut self, property: PropertyId, amount: i64) -> Result<i64, FeeError> {
        if amount < 0 {
            return Err(FeeError::InvalidAmount(amount));
        }

        let slot = self.cache.entry(property).or_insert(0);
        *slot = slot
            .checked_add(amount)
            .filter(|&v| v <= MAX_TOKENS)
            .ok_or(FeeError::CacheOverflow(property))?;

        debug!(property, amount, total = *slot, "Fee cached");
        Ok(*slot)
    }

    /// The cached total for a property.
    pub fn cached(&self, property: PropertyId) -> i64 {
        self.cache.get(&property).copied().unwrap_or(0)
    }

    /// All non-zero cache entries in property order.
    pub fn cached_all(&self) -> impl Iterator<Item = (PropertyId, i64)> + '_ {
        self.cache
            .iter()
            .filter(|(_, &total)| total > 0)
            .map(|(&property, &total)| (property, total))
    }

    /// Whether the cache has reached the property's threshold.
    pub fn should_distribute(&self, property: PropertyId, total_supply: i64) -> bool {
        self.cached(property) >= distribution_threshold(total_supply)
    }

    /// Distributes the cached total pro-rata over `owners`, each weighted
    /// by their qualifying balance. Shares use floor division; the
    /// remainder stays cached. Returns the recorded distribution, or
    /// `None` when there is nothing (or nobody) to distribute to.
    pub fn distribute(
        &mut self,
        property: PropertyId,
        block: u64,
        owners: &[(Address, i64)],
    ) -> Option<FeeDistribution> {
        let total = self.cached(property);
        if total <= 0 {
            return None;
        }

        let total_weight: i128 = owners.iter().map(|(_, weight)| *weight as i128).sum();
        if total_weight <= 0 {
            return None;
        }

        let mut recipients = Vec::with_capacity(owners.len());
        let mut distributed = 0i64;
        for (address, weight) in owners {
            let share = ((total as i128) * (*weight as i128) / total_weight) as i64;
            if share > 0 {
                recipients.push((address.clone(), share));
                distributed += share;
            }
        }

        if recipients.is_empty() {
            return None;
        }

        self.cache.insert(property, total - distributed);

        let record = FeeDistribution {
            id: self.next_id,
            property,
            block,
            total,
            recipients,
        };
        self.next_id += 1;
        info!(
            id = record.id,
            property,
            total,
            distributed,
            recipients = record.recipients.len(),
            "Fee distribution triggered"
        );
        self.distributions.push(record.clone());

        Some(record)
    }

    /// A distribution record by id.
    pub fn distribution(&self, id: u64) -> Option<&FeeDistribution> {
        self.distributions.iter().find(|d| d.id == id)
    }

    /// All distribution records for a property, oldest first.
    pub fn distributions_for(&self, property: PropertyId) -> Vec<&FeeDistribution> {
        self.distributions
            .iter()
            .filter(|d| d.property == property)
            .collect()
    }

    /// All distribution records, oldest first.
    pub fn distributions(&self) -> &[FeeDistribution] {
        &self.distributions
    }
}
