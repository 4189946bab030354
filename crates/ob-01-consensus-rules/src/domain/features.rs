//! The closed set of activatable protocol features.
//!
//! Feature ids are wire-protocol values carried by activation and
//! deactivation transactions; gaps in the numbering are reserved ids from
//! earlier protocol generations that this implementation does not carry.

use serde::{Deserialize, Serialize};

/// A consensus feature that can be switched on (with notice) or off
/// (immediately) by an authorized activation transaction.
///
/// Each feature maps to exactly one activation-height slot in
/// `ConsensusParams`; see `ConsensusParams::activation_slot_mut`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Feature {
    /// Gates the MetaDEx transaction types (trade and cancels).
    MetaDex = 2,
    /// Removes the issuer-bonus side effect of crowdsale contributions.
    GrantEffects = 4,
    /// Switches MetaDEx maker fill math to ceiling division.
    DexMath = 5,
    /// Gates the send-all transaction type.
    SendAll = 6,
    /// Forbids crowdsale contributions from the other ecosystem.
    CrowdsaleCrossover = 7,
    /// Lifts the native-token-pair requirement on the MetaDEx.
    TradeAllPairs = 8,
    /// Enables the trade fee and the fee cache/distribution machinery.
    Fees = 9,
    /// Gates cross-property send-to-owners (version 1).
    StoV1 = 10,
    /// Enforces the waiting period between enabling freezing and freezing.
    FreezeNotice = 14,
}

impl Feature {
    /// Wire-protocol id of this feature.
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Resolves a wire id to a feature, if recognized.
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            2 => Some(Feature::MetaDex),
            4 => Some(Feature::GrantEffects),
            5 => Some(Feature::DexMath),
            6 => Some(Feature::SendAll),
            7 => Some(Feature::CrowdsaleCrossover),
            8 => Some(Feature::TradeAllPairs),
            9 => Some(Feature::Fees),
            10 => Some(Feature::StoV1),
            14 => Some(Feature::FreezeNotice),
            _ => None,
        }
    }

    /// Display name used in logs and alerts.
    pub fn name(self) -> &'static str {
        match self {
            Feature::MetaDex => "Distributed token exchange",
            Feature::GrantEffects => "Remove crowdsale issuer bonus side effects",
            Feature::DexMath => "Exchange integer math update",
            Feature::SendAll => "Send All transactions",
            Feature::CrowdsaleCrossover => "Disable crowdsale ecosystem crossovers",
            Feature::TradeAllPairs => "Allow trading all pairs on the distributed exchange",
            Feature::Fees => "Fee system for non-native pair trades",
            Feature::StoV1 => "Cross-property Send To Owners",
            Feature::FreezeNotice => "Waiting period for enabling freezing",
        }
    }

    /// All features, in id order.
    pub fn all() -> [Feature; 9] {
        [
            Feature::MetaDex,
            Feature::GrantEffects,
            Feature::DexMath,
            Feature::SendAll,
            Feature::CrowdsaleCrossover,
            Feature::TradeAllPairs,
            Feature::Fees,
            Feature::StoV1,
            Feature::FreezeNotice,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        for feature in Feature::all() {
            assert_eq!(Feature::from_id(feature.id()), Some(feature));
        }
    }

    #[test]
    fn test_unknown_ids_rejected() {
        assert_eq!(Feature::from_id(0), None);
        assert_eq!(Feature::from_id(1), None);
        assert_eq!(Feature::from_id(3), None);
        assert_eq!(Feature::from_id(15), None);
        assert_eq!(Feature::from_id(u16::MAX), None);
    }

    #[test]
    fn test_names_are_distinct() {
        let names: std::collections::BTreeSet<_> =
            Feature::all().iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), Feature::all().len());
    }
}
