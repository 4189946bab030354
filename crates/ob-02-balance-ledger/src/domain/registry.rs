//! The property registry.
//!
//! Properties are created by issuance transactions and identified by
//! monotonically-increasing ids per ecosystem. The native tokens occupy ids
//! 1 and 2 and exist from genesis as managed properties of the genesis
//! issuer; user properties start at 3 (main) and offset+3 (test).

use super::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Ecosystem, PropertyId, TxHash, MAX_TOKENS, PROPERTY_OBL, PROPERTY_TEST_OBL,
    TEST_ECOSYSTEM_OFFSET,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Everything the ledger knows about one property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub id: PropertyId,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub url: String,
    pub data: String,
    /// Fixed-point with 8 decimal digits when true, integer units otherwise.
    pub divisible: bool,
    pub issuer: Address,
    /// Managed properties support grant/revoke/freeze operations.
    pub managed: bool,
    /// The property this crowdsale-origin property was sold against.
    pub crowdsale_desired: Option<PropertyId>,
    pub freezing_enabled: bool,
    /// Block at which freezing was enabled, for the notice waiting period.
    pub freezing_enabled_block: Option<u64>,
    pub creation_txid: TxHash,
    pub total_supply: i64,
}

impl PropertyInfo {
    fn native(id: PropertyId, name: &str, issuer: Address) -> Self {
        Self {
            id,
            name: name.to_owned(),
            category: "N/A".to_owned(),
            subcategory: "N/A".to_owned(),
            url: "obol.foundation".to_owned(),
            data: String::new(),
            divisible: true,
            issuer,
            managed: true,
            crowdsale_desired: None,
            freezing_enabled: false,
            freezing_enabled_block: None,
            creation_txid: TxHash::zero(),
            total_supply: 0,
        }
    }
}

/// All known properties plus per-ecosystem id allocation and the frozen
/// address set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRegistry {
    properties: BTreeMap<PropertyId, PropertyInfo>,
    frozen: BTreeSet<(PropertyId, Address)>,
    next_main: PropertyId,
    next_test: PropertyId,
}

impl PropertyRegistry {
    /// A registry holding only the two native tokens, issued from genesis
    /// by `genesis_issuer`.
    pub fn new(genesis_issuer: Address) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(
            PROPERTY_OBL,
            PropertyInfo::native(PROPERTY_OBL, "Obol", genesis_issuer.clone()),
        );
        properties.insert(
            PROPERTY_TEST_OBL,
            PropertyInfo::native(PROPERTY_TEST_OBL, "Test Obol", genesis_issuer),
        );

        Self {
            properties,
            frozen: BTreeSet::new(),
            next_main: 3,
            next_test: TEST_ECOSYSTEM_OFFSET + 3,
        }
    }

    /// Registers a new property, assigning the next id of its ecosystem.
    pub fn create(&mut self, ecosystem: Ecosystem, mut info: PropertyInfo) -> PropertyId {
        let id = match ecosystem {
            Ecosystem::Main => {
                let id = self.next_main;
                self.next_main += 1;
                id
            }
            Ecosystem::Test => {
                let id = self.next_test;
                self.next_test += 1;
                id
            }
        };

        info.id = id;
        info!(property = id, name = %info.name, "Property created");
        self.properties.insert(id, info);
        id
    }

    pub fn exists(&self, property: PropertyId) -> bool {
        self.properties.contains_key(&property)
    }

    pub fn get(&self, property: PropertyId) -> Option<&PropertyInfo> {
        self.properties.get(&property)
    }

    pub fn require(&self, property: PropertyId) -> Result<&PropertyInfo, LedgerError> {
        self.properties
            .get(&property)
            .ok_or(LedgerError::PropertyNotFound(property))
    }

    pub fn require_mut(&mut self, property: PropertyId) -> Result<&mut PropertyInfo, LedgerError> {
        self.properties
            .get_mut(&property)
            .ok_or(LedgerError::PropertyNotFound(property))
    }

    /// A managed property, or an error naming what is wrong.
    pub fn require_managed(&self, property: PropertyId) -> Result<&PropertyInfo, LedgerError> {
        let info = self.require(property)?;
        if !info.managed {
            return Err(LedgerError::NotManaged(property));
        }
        Ok(info)
    }

    /// Verifies `sender` is the issuer of the property.
    pub fn require_issuer(
        &self,
        property: PropertyId,
        sender: &Address,
    ) -> Result<&PropertyInfo, LedgerError> {
        let info = self.require(property)?;
        if &info.issuer != sender {
            return Err(LedgerError::NotIssuer {
                property,
                sender: sender.clone(),
            });
        }
        Ok(info)
    }

    /// Applies a supply delta (positive for grant/issuance, negative for
    /// revoke). The result must stay within [0, MAX_TOKENS].
    pub fn adjust_supply(&mut self, property: PropertyId, delta: i64) -> Result<(), LedgerError> {
        let info = self.require_mut(property)?;
        let updated = info
            .total_supply
            .checked_add(delta)
            .filter(|&v| (0..=MAX_TOKENS).contains(&v))
            .ok_or(LedgerError::SupplyOutOfRange(property))?;
        info.total_supply = updated;
        Ok(())
    }

    /// Enables freezing for a managed property, recording the block for
    /// the notice waiting period.
    pub fn enable_freezing(&mut self, property: PropertyId, block: u64) -> Result<(), LedgerError> {
        let info = self.require_mut(property)?;
        if info.freezing_enabled {
            return Err(LedgerError::FreezingAlreadyEnabled(property));
        }
        info.freezing_enabled = true;
        info.freezing_enabled_block = Some(block);
        Ok(())
    }

    /// Disables freezing. Already-frozen addresses stay frozen until
    /// explicitly unfrozen.
    pub fn disable_freezing(&mut self, property: PropertyId) -> Result<(), LedgerError> {
        let info = self.require_mut(property)?;
        if !info.freezing_enabled {
            return Err(LedgerError::FreezingNotEnabled(property));
        }
        info.freezing_enabled = false;
        info.freezing_enabled_block = None;
        Ok(())
    }

    pub fn freeze(&mut self, property: PropertyId, address: &Address) -> Result<(), LedgerError> {
        if !self.frozen.insert((property, address.clone())) {
            return Err(LedgerError::AlreadyFrozen {
                property,
                address: address.clone(),
            });
        }
        Ok(())
    }

    pub fn unfreeze(&mut self, property: PropertyId, address: &Address) -> Result<(), LedgerError> {
        if !self.frozen.remove(&(property, address.clone())) {
            return Err(LedgerError::NotFrozen {
                property,
                address: address.clone(),
            });
        }
        Ok(())
    }

    pub fn is_frozen(&self, property: PropertyId, address: &Address) -> bool {
        self.frozen.contains(&(property, address.clone()))
    }

    /// All properties in id order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyInfo> {
        self.properties.values()
    }
}
