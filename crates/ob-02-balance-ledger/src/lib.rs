//! # OB-02: Balance Ledger Subsystem
//!
//! The substrate every other subsystem reads and mutates: per-(address,
//! property) tri-partite balances and the property registry.
//!
//! ## Architecture
//!
//! - **Domain**: tally entities, the ledger map, the property registry
//!
//! The ledger enforces non-negativity and atomic debits; the conservation
//! law (sum of balances equals issued supply) is a caller obligation of the
//! issuance/grant/revoke handlers and is verified by the test suites.

pub mod domain;

pub use domain::entities::{BalanceBucket, Tally};
pub use domain::errors::LedgerError;
pub use domain::ledger::BalanceLedger;
pub use domain::registry::{PropertyInfo, PropertyRegistry};
