//! Core identifier and amount types shared by every subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash of a layer transaction on the anchor chain.
pub type TxHash = primitive_types::H256;

/// Hash of an anchor-chain block.
pub type BlockHash = primitive_types::H256;

/// Identifier of a fungible property tracked by the ledger.
pub type PropertyId = u32;

/// Pseudo property id of the anchor coin, used as a wildcard in the
/// transaction restriction table.
pub const PROPERTY_ANCHOR: PropertyId = 0;

/// The native token of the production ecosystem.
pub const PROPERTY_OBL: PropertyId = 1;

/// The native token of the test ecosystem.
pub const PROPERTY_TEST_OBL: PropertyId = 2;

/// First identifier of the test-ecosystem range. Everything above belongs to
/// the test ecosystem; everything at or below is production.
pub const TEST_ECOSYSTEM_OFFSET: PropertyId = 0x8000_0000;

/// Smallest-unit multiplier for divisible properties (8 decimal digits).
pub const COIN: i64 = 100_000_000;

/// Hard cap on the number of smallest units of any single property.
pub const MAX_TOKENS: i64 = i64::MAX;

/// An anchor-chain address, kept opaque.
///
/// Orders lexicographically; every consensus-relevant iteration over
/// addresses relies on this ordering being stable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self(address.to_owned())
    }
}

/// One of the two disjoint property-id ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    Main,
    Test,
}

impl Ecosystem {
    /// The ecosystem a property id belongs to. The test-ecosystem native
    /// token sits below the offset but still counts as test.
    pub fn of(property: PropertyId) -> Self {
        if property == PROPERTY_TEST_OBL || property >= TEST_ECOSYSTEM_OFFSET {
            Ecosystem::Test
        } else {
            Ecosystem::Main
        }
    }

    /// The native token of this ecosystem.
    pub fn native_token(self) -> PropertyId {
        match self {
            Ecosystem::Main => PROPERTY_OBL,
            Ecosystem::Test => PROPERTY_TEST_OBL,
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ecosystem::Main => f.write_str("main"),
            Ecosystem::Test => f.write_str("test"),
        }
    }
}

/// True if the property id belongs to the test ecosystem.
pub fn is_test_ecosystem_property(property: PropertyId) -> bool {
    Ecosystem::of(property) == Ecosystem::Test
}

/// True for the native token of either ecosystem.
pub fn is_native_token(property: PropertyId) -> bool {
    property == PROPERTY_OBL || property == PROPERTY_TEST_OBL
}

/// True if both properties belong to the same ecosystem.
pub fn same_ecosystem(a: PropertyId, b: PropertyId) -> bool {
    Ecosystem::of(a) == Ecosystem::of(b)
}
