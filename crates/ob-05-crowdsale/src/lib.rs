//! # OB-05: Crowdsale Subsystem
//!
//! Per-property fundraising: a variable-issuance property opens a
//! crowdsale; contributions in the desired property mint participant
//! tokens (plus an issuer bonus under the legacy rule set) until the sale
//! closes by deadline, by an explicit close transaction, or by hitting the
//! token cap. Every contribution is recorded in a per-sale historical
//! ledger keyed by the contributing transaction.
//!
//! The registry tracks sale state and the mint math; crediting balances
//! and adjusting supply stay with the transaction handlers, which own the
//! conservation law.

pub mod errors;
pub mod sale;

pub use errors::CrowdsaleError;
pub use sale::{
    calculate_fundraiser_tokens, CloseReason, ClosedCrowdsale, Contribution, Crowdsale,
    CrowdsaleRegistry, FundraiserGrant, SECONDS_PER_WEEK,
};
