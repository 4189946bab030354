//! Per-network consensus parameters and the transaction restriction table.
//!
//! Parameter values are consensus constants for each network; the only
//! mutation path after construction is the feature activation gate in
//! `ConsensusContext`, which writes through `activation_slot_mut`.

use super::features::Feature;
use serde::{Deserialize, Serialize};
use shared_types::payloads::{
    TX_TYPE_ACTIVATION, TX_TYPE_ALERT, TX_TYPE_CHANGE_ISSUER, TX_TYPE_CLOSE_CROWDSALE,
    TX_TYPE_CREATE_CROWDSALE, TX_TYPE_CREATE_PROPERTY_FIXED, TX_TYPE_CREATE_PROPERTY_MANAGED,
    TX_TYPE_DEACTIVATION, TX_TYPE_DEX_ACCEPT, TX_TYPE_DEX_SELL_OFFER, TX_TYPE_DISABLE_FREEZING,
    TX_TYPE_ENABLE_FREEZING, TX_TYPE_FREEZE_TOKENS, TX_TYPE_GRANT_TOKENS,
    TX_TYPE_METADEX_CANCEL_ECOSYSTEM, TX_TYPE_METADEX_CANCEL_PAIR, TX_TYPE_METADEX_CANCEL_PRICE,
    TX_TYPE_METADEX_TRADE, TX_TYPE_REVOKE_TOKENS, TX_TYPE_SEND_ALL, TX_TYPE_SEND_TO_OWNERS,
    TX_TYPE_SIMPLE_SEND, TX_TYPE_UNFREEZE_TOKENS, TX_VERSION_ANY,
};
use shared_types::Address;

/// Sentinel height for "not activated on this network".
pub const BLOCK_NEVER: u64 = u64::MAX;

/// The networks the engine can run against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Main,
    Test,
    Regtest,
}

/// One row of the transaction restriction table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionRestriction {
    pub tx_type: u16,
    pub version: u16,
    /// Whether the anchor-coin wildcard property id is acceptable.
    pub allow_wildcard: bool,
    pub activation_block: u64,
}

/// Consensus constants for one network.
///
/// Heights are anchor-chain block heights; a value of [`BLOCK_NEVER`] means
/// the associated transaction type or feature is not live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub network: Network,
    /// First block at which the layer processes transactions.
    pub genesis_block: u64,
    /// Lower bound of the activation notice period, in blocks.
    pub min_activation_blocks: u64,
    /// Upper bound of the activation notice period, in blocks.
    pub max_activation_blocks: u64,
    /// Blocks between enabling freezing and the first permitted freeze.
    pub freeze_wait_period: u64,

    // Transaction restrictions
    pub alert_block: u64,
    pub send_block: u64,
    pub dex_block: u64,
    pub sp_block: u64,
    pub managed_sp_block: u64,
    pub sto_block: u64,
    pub stov1_block: u64,
    pub metadex_block: u64,
    pub send_all_block: u64,

    // Other feature activations
    pub grant_effects_block: u64,
    pub dex_math_block: u64,
    pub crowdsale_crossover_block: u64,
    pub trade_all_pairs_block: u64,
    pub fees_block: u64,
    pub freeze_notice_block: u64,

    /// Source address accepted for alert/activation transactions; `None`
    /// accepts any sender (regtest only).
    pub authorized_admin: Option<Address>,
}

impl ConsensusParams {
    /// Consensus parameters for mainnet.
    pub fn main() -> Self {
        Self {
            network: Network::Main,
            genesis_block: 4_020_000,
            // Notice range for feature activations:
            min_activation_blocks: 28_800,  // ~2 weeks
            max_activation_blocks: 172_800, // ~12 weeks
            freeze_wait_period: 57_600,     // ~4 weeks
            alert_block: 0,
            send_block: 4_020_000,
            dex_block: 4_032_000,
            sp_block: 4_032_000,
            managed_sp_block: 4_032_000,
            sto_block: 4_032_000,
            stov1_block: BLOCK_NEVER,
            metadex_block: 4_032_000,
            send_all_block: 4_032_000,
            grant_effects_block: 4_032_000,
            dex_math_block: 4_032_000,
            crowdsale_crossover_block: 4_032_000,
            trade_all_pairs_block: 4_032_000,
            fees_block: BLOCK_NEVER,
            freeze_notice_block: BLOCK_NEVER,
            authorized_admin: Some(Address::from("oMainAdministrativeNotice1111111111")),
        }
    }

    /// Consensus parameters for testnet.
    pub fn test() -> Self {
        Self {
            network: Network::Test,
            genesis_block: 263_000,
            min_activation_blocks: 0,
            max_activation_blocks: 999_999,
            freeze_wait_period: 0,
            alert_block: 0,
            send_block: 0,
            dex_block: 0,
            sp_block: 0,
            managed_sp_block: 0,
            sto_block: 0,
            stov1_block: 0,
            metadex_block: 0,
            send_all_block: 0,
            grant_effects_block: 0,
            dex_math_block: 0,
            crowdsale_crossover_block: 0,
            trade_all_pairs_block: 0,
            fees_block: 0,
            freeze_notice_block: 0,
            authorized_admin: Some(Address::from("oTestAdministrativeNotice1111111111")),
        }
    }

    /// Consensus parameters for regression testing. Features start
    /// deactivated so tests exercise the activation path explicitly.
    pub fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            genesis_block: 101,
            min_activation_blocks: 5,
            max_activation_blocks: 10,
            freeze_wait_period: 10,
            alert_block: 0,
            send_block: 0,
            dex_block: 0,
            sp_block: 0,
            managed_sp_block: 0,
            sto_block: 0,
            stov1_block: BLOCK_NEVER,
            metadex_block: 0,
            send_all_block: 0,
            grant_effects_block: BLOCK_NEVER,
            dex_math_block: BLOCK_NEVER,
            crowdsale_crossover_block: BLOCK_NEVER,
            trade_all_pairs_block: BLOCK_NEVER,
            fees_block: BLOCK_NEVER,
            freeze_notice_block: BLOCK_NEVER,
            authorized_admin: None,
        }
    }

    /// Parameters for the given network.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::test(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// The activation-height slot backing a feature (read side).
    pub fn activation_height(&self, feature: Feature) -> u64 {
        match feature {
            Feature::MetaDex => self.metadex_block,
            Feature::GrantEffects => self.grant_effects_block,
            Feature::DexMath => self.dex_math_block,
            Feature::SendAll => self.send_all_block,
            Feature::CrowdsaleCrossover => self.crowdsale_crossover_block,
            Feature::TradeAllPairs => self.trade_all_pairs_block,
            Feature::Fees => self.fees_block,
            Feature::StoV1 => self.stov1_block,
            Feature::FreezeNotice => self.freeze_notice_block,
        }
    }

    /// The activation-height slot backing a feature (write side). Both the
    /// activate and deactivate paths go through this single mapping.
    pub fn activation_slot_mut(&mut self, feature: Feature) -> &mut u64 {
        match feature {
            Feature::MetaDex => &mut self.metadex_block,
            Feature::GrantEffects => &mut self.grant_effects_block,
            Feature::DexMath => &mut self.dex_math_block,
            Feature::SendAll => &mut self.send_all_block,
            Feature::CrowdsaleCrossover => &mut self.crowdsale_crossover_block,
            Feature::TradeAllPairs => &mut self.trade_all_pairs_block,
            Feature::Fees => &mut self.fees_block,
            Feature::StoV1 => &mut self.stov1_block,
            Feature::FreezeNotice => &mut self.freeze_notice_block,
        }
    }

    /// The transaction types and versions this network recognizes, and the
    /// blocks at which they are enabled.
    pub fn restrictions(&self) -> Vec<TransactionRestriction> {
        let row = |tx_type, version, allow_wildcard, activation_block| TransactionRestriction {
            tx_type,
            version,
            allow_wildcard,
            activation_block,
        };

        vec![
            row(TX_TYPE_ALERT, TX_VERSION_ANY, true, self.alert_block),
            row(TX_TYPE_ACTIVATION, TX_VERSION_ANY, true, self.alert_block),
            row(TX_TYPE_DEACTIVATION, TX_VERSION_ANY, true, self.alert_block),
            row(TX_TYPE_SIMPLE_SEND, 0, false, self.send_block),
            row(TX_TYPE_DEX_SELL_OFFER, 0, false, self.dex_block),
            row(TX_TYPE_DEX_SELL_OFFER, 1, false, self.dex_block),
            row(TX_TYPE_DEX_ACCEPT, 0, false, self.dex_block),
            row(TX_TYPE_CREATE_PROPERTY_FIXED, 0, false, self.sp_block),
            row(TX_TYPE_CREATE_CROWDSALE, 0, false, self.sp_block),
            row(TX_TYPE_CREATE_CROWDSALE, 1, false, self.sp_block),
            row(TX_TYPE_CLOSE_CROWDSALE, 0, false, self.sp_block),
            row(
                TX_TYPE_CREATE_PROPERTY_MANAGED,
                0,
                false,
                self.managed_sp_block,
            ),
            row(TX_TYPE_GRANT_TOKENS, 0, false, self.managed_sp_block),
            row(TX_TYPE_REVOKE_TOKENS, 0, false, self.managed_sp_block),
            row(TX_TYPE_CHANGE_ISSUER, 0, false, self.managed_sp_block),
            row(TX_TYPE_ENABLE_FREEZING, 0, false, self.managed_sp_block),
            row(TX_TYPE_DISABLE_FREEZING, 0, false, self.managed_sp_block),
            row(TX_TYPE_FREEZE_TOKENS, 0, false, self.managed_sp_block),
            row(TX_TYPE_UNFREEZE_TOKENS, 0, false, self.managed_sp_block),
            row(TX_TYPE_SEND_TO_OWNERS, 0, false, self.sto_block),
            row(TX_TYPE_SEND_TO_OWNERS, 1, false, self.stov1_block),
            row(TX_TYPE_METADEX_TRADE, 0, false, self.metadex_block),
            row(TX_TYPE_METADEX_CANCEL_PRICE, 0, false, self.metadex_block),
            row(TX_TYPE_METADEX_CANCEL_PAIR, 0, false, self.metadex_block),
            row(
                TX_TYPE_METADEX_CANCEL_ECOSYSTEM,
                0,
                false,
                self.metadex_block,
            ),
            row(TX_TYPE_SEND_ALL, 0, false, self.send_all_block),
        ]
    }
}
