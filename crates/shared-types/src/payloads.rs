//! Typed transaction payloads.
//!
//! The chain layer decodes raw packets into these shapes before handing them
//! to the state engine; type and version numbers follow the wire protocol
//! and drive the per-network restriction table.

use crate::entities::{Address, Ecosystem, PropertyId, TxHash, PROPERTY_ANCHOR};
use serde::{Deserialize, Serialize};

/// Transaction type numbers as they appear on the wire.
pub const TX_TYPE_SIMPLE_SEND: u16 = 0;
pub const TX_TYPE_SEND_TO_OWNERS: u16 = 3;
pub const TX_TYPE_SEND_ALL: u16 = 4;
pub const TX_TYPE_DEX_SELL_OFFER: u16 = 20;
pub const TX_TYPE_DEX_ACCEPT: u16 = 22;
pub const TX_TYPE_METADEX_TRADE: u16 = 25;
pub const TX_TYPE_METADEX_CANCEL_PRICE: u16 = 26;
pub const TX_TYPE_METADEX_CANCEL_PAIR: u16 = 27;
pub const TX_TYPE_METADEX_CANCEL_ECOSYSTEM: u16 = 28;
pub const TX_TYPE_CREATE_PROPERTY_FIXED: u16 = 50;
pub const TX_TYPE_CREATE_CROWDSALE: u16 = 51;
pub const TX_TYPE_CLOSE_CROWDSALE: u16 = 53;
pub const TX_TYPE_CREATE_PROPERTY_MANAGED: u16 = 54;
pub const TX_TYPE_GRANT_TOKENS: u16 = 55;
pub const TX_TYPE_REVOKE_TOKENS: u16 = 56;
pub const TX_TYPE_CHANGE_ISSUER: u16 = 70;
pub const TX_TYPE_ENABLE_FREEZING: u16 = 71;
pub const TX_TYPE_DISABLE_FREEZING: u16 = 72;
pub const TX_TYPE_FREEZE_TOKENS: u16 = 185;
pub const TX_TYPE_UNFREEZE_TOKENS: u16 = 186;
pub const TX_TYPE_DEACTIVATION: u16 = 65533;
pub const TX_TYPE_ACTIVATION: u16 = 65534;
pub const TX_TYPE_ALERT: u16 = 65535;

/// Version carried by alert, activation and deactivation transactions.
pub const TX_VERSION_ANY: u16 = 0xFFFF;

/// Action code of a DEx sell-offer transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DexAction {
    New,
    Update,
    Cancel,
}

/// Descriptive fields shared by all property-creation payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyData {
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub url: String,
    pub data: String,
}

impl PropertyData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A fully-decoded layer transaction payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TxPayload {
    SimpleSend {
        recipient: Address,
        property: PropertyId,
        amount: i64,
    },
    /// v0 distributes `property` to its own holders; v1 may name a distinct
    /// `distribution_property` whose holders receive the send.
    SendToOwners {
        property: PropertyId,
        amount: i64,
        distribution_property: PropertyId,
    },
    SendAll {
        recipient: Address,
        ecosystem: Ecosystem,
    },
    DexSellOffer {
        property: PropertyId,
        amount_for_sale: i64,
        anchor_desired: i64,
        payment_window: u8,
        min_accept_fee: i64,
        action: DexAction,
    },
    DexAccept {
        seller: Address,
        property: PropertyId,
        amount: i64,
    },
    MetaDexTrade {
        property_for_sale: PropertyId,
        amount_for_sale: i64,
        property_desired: PropertyId,
        amount_desired: i64,
    },
    MetaDexCancelPrice {
        property_for_sale: PropertyId,
        amount_for_sale: i64,
        property_desired: PropertyId,
        amount_desired: i64,
    },
    MetaDexCancelPair {
        property_for_sale: PropertyId,
        property_desired: PropertyId,
    },
    MetaDexCancelEcosystem {
        ecosystem: Ecosystem,
    },
    CreatePropertyFixed {
        ecosystem: Ecosystem,
        divisible: bool,
        info: PropertyData,
        amount: i64,
    },
    CreateCrowdsale {
        ecosystem: Ecosystem,
        divisible: bool,
        info: PropertyData,
        property_desired: PropertyId,
        tokens_per_unit: i64,
        deadline: i64,
        early_bird_bonus: u8,
        issuer_percentage: u8,
    },
    CloseCrowdsale {
        property: PropertyId,
    },
    CreatePropertyManaged {
        ecosystem: Ecosystem,
        divisible: bool,
        info: PropertyData,
    },
    GrantTokens {
        recipient: Address,
        property: PropertyId,
        amount: i64,
    },
    RevokeTokens {
        property: PropertyId,
        amount: i64,
    },
    ChangeIssuer {
        recipient: Address,
        property: PropertyId,
    },
    EnableFreezing {
        property: PropertyId,
    },
    DisableFreezing {
        property: PropertyId,
    },
    FreezeTokens {
        target: Address,
        property: PropertyId,
    },
    UnfreezeTokens {
        target: Address,
        property: PropertyId,
    },
    FeatureActivation {
        feature_id: u16,
        activation_block: u64,
        min_client_version: u32,
    },
    FeatureDeactivation {
        feature_id: u16,
    },
    Alert {
        alert_type: u16,
        expiry: u64,
        message: String,
    },
}

impl TxPayload {
    /// The wire type number of this payload.
    pub fn tx_type(&self) -> u16 {
        match self {
            TxPayload::SimpleSend { .. } => TX_TYPE_SIMPLE_SEND,
            TxPayload::SendToOwners { .. } => TX_TYPE_SEND_TO_OWNERS,
            TxPayload::SendAll { .. } => TX_TYPE_SEND_ALL,
            TxPayload::DexSellOffer { .. } => TX_TYPE_DEX_SELL_OFFER,
            TxPayload::DexAccept { .. } => TX_TYPE_DEX_ACCEPT,
            TxPayload::MetaDexTrade { .. } => TX_TYPE_METADEX_TRADE,
            TxPayload::MetaDexCancelPrice { .. } => TX_TYPE_METADEX_CANCEL_PRICE,
            TxPayload::MetaDexCancelPair { .. } => TX_TYPE_METADEX_CANCEL_PAIR,
            TxPayload::MetaDexCancelEcosystem { .. } => TX_TYPE_METADEX_CANCEL_ECOSYSTEM,
            TxPayload::CreatePropertyFixed { .. } => TX_TYPE_CREATE_PROPERTY_FIXED,
            TxPayload::CreateCrowdsale { .. } => TX_TYPE_CREATE_CROWDSALE,
            TxPayload::CloseCrowdsale { .. } => TX_TYPE_CLOSE_CROWDSALE,
            TxPayload::CreatePropertyManaged { .. } => TX_TYPE_CREATE_PROPERTY_MANAGED,
            TxPayload::GrantTokens { .. } => TX_TYPE_GRANT_TOKENS,
            TxPayload::RevokeTokens { .. } => TX_TYPE_REVOKE_TOKENS,
            TxPayload::ChangeIssuer { .. } => TX_TYPE_CHANGE_ISSUER,
            TxPayload::EnableFreezing { .. } => TX_TYPE_ENABLE_FREEZING,
            TxPayload::DisableFreezing { .. } => TX_TYPE_DISABLE_FREEZING,
            TxPayload::FreezeTokens { .. } => TX_TYPE_FREEZE_TOKENS,
            TxPayload::UnfreezeTokens { .. } => TX_TYPE_UNFREEZE_TOKENS,
            TxPayload::FeatureActivation { .. } => TX_TYPE_ACTIVATION,
            TxPayload::FeatureDeactivation { .. } => TX_TYPE_DEACTIVATION,
            TxPayload::Alert { .. } => TX_TYPE_ALERT,
        }
    }

    /// The property id the restriction table is consulted with.
    ///
    /// Administrative payloads use the anchor wildcard; ecosystem-scoped
    /// payloads gate on the ecosystem's native token.
    pub fn gating_property(&self) -> PropertyId {
        match self {
            TxPayload::SimpleSend { property, .. }
            | TxPayload::SendToOwners { property, .. }
            | TxPayload::DexSellOffer { property, .. }
            | TxPayload::DexAccept { property, .. }
            | TxPayload::CloseCrowdsale { property }
            | TxPayload::GrantTokens { property, .. }
            | TxPayload::RevokeTokens { property, .. }
            | TxPayload::ChangeIssuer { property, .. }
            | TxPayload::EnableFreezing { property }
            | TxPayload::DisableFreezing { property }
            | TxPayload::FreezeTokens { property, .. }
            | TxPayload::UnfreezeTokens { property, .. } => *property,

            TxPayload::MetaDexTrade {
                property_for_sale, ..
            }
            | TxPayload::MetaDexCancelPrice {
                property_for_sale, ..
            }
            | TxPayload::MetaDexCancelPair {
                property_for_sale, ..
            } => *property_for_sale,

            TxPayload::SendAll { ecosystem, .. }
            | TxPayload::MetaDexCancelEcosystem { ecosystem }
            | TxPayload::CreatePropertyFixed { ecosystem, .. }
            | TxPayload::CreateCrowdsale { ecosystem, .. }
            | TxPayload::CreatePropertyManaged { ecosystem, .. } => ecosystem.native_token(),

            TxPayload::FeatureActivation { .. }
            | TxPayload::FeatureDeactivation { .. }
            | TxPayload::Alert { .. } => PROPERTY_ANCHOR,
        }
    }
}

/// A decoded transaction with its confirmation identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedTx {
    pub txid: TxHash,
    pub sender: Address,
    pub version: u16,
    /// Mining fee the transaction paid on the anchor chain.
    pub fee: i64,
    pub payload: TxPayload,
}

impl ParsedTx {
    pub fn new(txid: TxHash, sender: Address, version: u16, payload: TxPayload) -> Self {
        Self {
            txid,
            sender,
            version,
            fee: 0,
            payload,
        }
    }

    pub fn with_fee(mut self, fee: i64) -> Self {
        self.fee = fee;
        self
    }

    pub fn tx_type(&self) -> u16 {
        self.payload.tx_type()
    }
}

/// What a successfully applied transaction did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    /// Ledger effects applied, nothing further to report.
    Applied,
    /// A new property was created with the returned id.
    PropertyCreated(PropertyId),
    /// A MetaDEx trade matched `fills` resting orders; `rested` reports
    /// whether a remainder was left on the book.
    Traded { fills: u32, rested: bool },
}
