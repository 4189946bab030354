//! Crowdsale state machine and mint math.

use crate::errors::CrowdsaleError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, PropertyId, TxHash, COIN, MAX_TOKENS};
use std::collections::BTreeMap;
use tracing::info;

pub const SECONDS_PER_WEEK: i64 = 604_800;

/// One recorded contribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub contributor: Address,
    pub amount_invested: i64,
    /// Whole weeks elapsed since the sale opened.
    pub week_index: u64,
    pub participant_tokens: i64,
    pub issuer_tokens: i64,
}

/// Why a crowdsale closed. The paths are mutually exclusive and recorded
/// for audit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    DeadlinePassed,
    CloseTransaction(TxHash),
    MaxTokensReached,
}

/// An active crowdsale, keyed by the property being sold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crowdsale {
    pub property: PropertyId,
    pub property_desired: PropertyId,
    /// Tokens granted per whole unit invested, before bonus.
    pub tokens_per_unit: i64,
    /// Bonus percent per elapsed week.
    pub early_bird_bonus: u8,
    /// Percent of each grant additionally minted for the issuer.
    pub issuer_percentage: u8,
    pub start_time: i64,
    pub deadline: i64,
    pub issuer: Address,
    pub txid: TxHash,
    /// Historical ledger: contribution txid to what it minted.
    pub contributions: BTreeMap<TxHash, Contribution>,
}

impl Crowdsale {
    /// Whole weeks elapsed at `timestamp`.
    pub fn weeks_elapsed(&self, timestamp: i64) -> u64 {
        let elapsed = (timestamp - self.start_time).max(0);
        (elapsed / SECONDS_PER_WEEK) as u64
    }

    /// Tokens minted so far across all contributions.
    pub fn tokens_minted(&self) -> i64 {
        self.contributions
            .values()
            .map(|c| c.participant_tokens + c.issuer_tokens)
            .sum()
    }
}

/// A crowdsale that has ended, with its close disposition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedCrowdsale {
    pub sale: Crowdsale,
    pub close_reason: CloseReason,
    pub close_block: u64,
}

/// What one contribution mints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundraiserGrant {
    pub participant_tokens: i64,
    pub issuer_tokens: i64,
    /// The token cap was hit; the sale must close.
    pub capped: bool,
}

/// Computes the tokens a contribution mints.
///
/// The base rate is `tokens_per_unit` per whole invested unit, multiplied
/// by `1 + early_bird_bonus% * weeks_elapsed`. All arithmetic is integer
/// with 128-bit intermediates; the combined grant is clamped so the
/// property never exceeds the token cap.
pub fn calculate_fundraiser_tokens(
    amount_invested: i64,
    invested_divisible: bool,
    tokens_per_unit: i64,
    early_bird_bonus: u8,
    weeks_elapsed: u64,
    issuer_percentage: u8,
    tokens_minted_so_far: i64,
    grant_issuer_bonus: bool,
) -> FundraiserGrant {
    let bonus_percent = 100i128 + (early_bird_bonus as i128) * (weeks_elapsed as i128);
    let unit_divisor = if invested_divisible { COIN as i128 } else { 1 };

    let participant = (amount_invested as i128) * (tokens_per_unit as i128) * bonus_percent
        / 100
        / unit_divisor;
    let issuer = if grant_issuer_bonus {
        participant * (issuer_percentage as i128) / 100
    } else {
        0
    };

    let headroom = (MAX_TOKENS - tokens_minted_so_far) as i128;
    let mut capped = false;

    let participant_clamped = if participant > headroom {
        capped = true;
        headroom
    } else {
        participant
    };
    let issuer_clamped = if issuer > headroom - participant_clamped {
        capped = true;
        headroom - participant_clamped
    } else {
        issuer
    };

    FundraiserGrant {
        participant_tokens: participant_clamped as i64,
        issuer_tokens: issuer_clamped as i64,
        capped,
    }
}

/// Active and closed crowdsales.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsaleRegistry {
    active: BTreeMap<PropertyId, Crowdsale>,
    closed: BTreeMap<PropertyId, ClosedCrowdsale>,
}

impl CrowdsaleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a crowdsale for a freshly created property.
    pub fn open(&mut self, sale: Crowdsale) -> Result<(), CrowdsaleError> {
        if sale.tokens_per_unit <= 0 {
            return Err(CrowdsaleError::InvalidParameter("tokens_per_unit"));
        }
        if sale.deadline <= sale.start_time {
            return Err(CrowdsaleError::InvalidParameter("deadline"));
        }
        if self.active.contains_key(&sale.property) {
            return Err(CrowdsaleError::AlreadyOpen(sale.property));
        }

        info!(property = sale.property, "Crowdsale opened");
        self.active.insert(sale.property, sale);
        Ok(())
    }

    pub fn is_active(&self, property: PropertyId) -> bool {
        self.active.contains_key(&property)
    }

    pub fn get_active(&self, property: PropertyId) -> Option<&Crowdsale> {
        self.active.get(&property)
    }

    pub fn get_closed(&self, property: PropertyId) -> Option<&ClosedCrowdsale> {
        self.closed.get(&property)
    }

    /// The active crowdsale selling `property` whose issuer is `issuer`
    /// and whose desired payment property is `property_desired`. This is
    /// how a plain send to an issuer is recognized as a contribution.
    pub fn active_for_issuer(
        &self,
        issuer: &Address,
        property_desired: PropertyId,
    ) -> Option<&Crowdsale> {
        self.active
            .values()
            .find(|sale| &sale.issuer == issuer && sale.property_desired == property_desired)
    }

    /// Records a contribution against an active sale.
    pub fn record_contribution(
        &mut self,
        property: PropertyId,
        txid: TxHash,
        contribution: Contribution,
    ) -> Result<(), CrowdsaleError> {
        let sale = self
            .active
            .get_mut(&property)
            .ok_or(CrowdsaleError::NotActive(property))?;
        sale.contributions.insert(txid, contribution);
        Ok(())
    }

    /// Closes an active sale, recording the reason.
    pub fn close(
        &mut self,
        property: PropertyId,
        reason: CloseReason,
        block: u64,
    ) -> Result<&ClosedCrowdsale, CrowdsaleError> {
        let sale = self
            .active
            .remove(&property)
            .ok_or(CrowdsaleError::NotActive(property))?;

        info!(property, ?reason, "Crowdsale closed");
        let record = ClosedCrowdsale {
            sale,
            close_reason: reason,
            close_block: block,
        };
        Ok(&*self.closed.entry(property).or_insert(record))
    }

    /// Closes every active sale whose deadline has passed at `block_time`.
    /// Returns the closed property ids.
    pub fn close_expired(&mut self, block_time: i64, block: u64) -> Vec<PropertyId> {
        let due: Vec<_> = self
            .active
            .iter()
            .filter(|(_, sale)| block_time >= sale.deadline)
            .map(|(property, _)| *property)
            .collect();

        for property in &due {
            // close() cannot fail for ids collected above
            let _ = self.close(*property, CloseReason::DeadlinePassed, block);
        }

        due
    }

    /// All active sales in property order.
    pub fn active(&self) -> impl Iterator<Item = &Crowdsale> {
        self.active.values()
    }

    /// All closed sales in property order.
    pub fn closed(&self) -> impl Iterator<Item = &ClosedCrowdsale> {
        self.closed.values()
    }
}
