//! Shared scaffolding for engine scenarios.

use node_runtime::StateEngine;
use primitive_types::H256;
use shared_types::{
    Address, ParsedTx, PropertyData, PropertyId, TxHash, TxPayload, TX_VERSION_ANY,
};

/// Regtest genesis height.
pub const GENESIS: u64 = 101;

pub fn addr(name: &str) -> Address {
    Address::from(name)
}

pub fn txid(n: u64) -> TxHash {
    TxHash::from_low_u64_be(n)
}

pub fn block_hash(height: u64) -> H256 {
    H256::from_low_u64_be(height)
}

pub fn tx(n: u64, sender: &str, payload: TxPayload) -> ParsedTx {
    ParsedTx::new(txid(n), addr(sender), 0, payload)
}

/// Alert, activation and deactivation transactions carry the
/// administrative wire version.
pub fn admin_tx(n: u64, sender: &str, payload: TxPayload) -> ParsedTx {
    ParsedTx::new(txid(n), addr(sender), TX_VERSION_ANY, payload)
}

pub fn named(name: &str) -> PropertyData {
    PropertyData::named(name)
}

/// Sum of every address's holdings of a property plus its cached fees;
/// equals total issued supply whenever the conservation law holds.
pub fn circulating_plus_cached(engine: &StateEngine, property: PropertyId) -> i64 {
    let held: i64 = engine
        .get_property_holders(property)
        .iter()
        .map(|(_, tally)| tally.total())
        .sum();
    held + engine.get_fee_cache(property)
}

/// Asserts the conservation law for a property.
pub fn assert_conserved(engine: &StateEngine, property: PropertyId) {
    let supply = engine
        .get_property(property)
        .map(|info| info.total_supply)
        .unwrap_or(0);
    assert_eq!(
        circulating_plus_cached(engine, property),
        supply,
        "conservation violated for property {property}"
    );
}
