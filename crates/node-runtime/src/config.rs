//! Engine configuration.

use ob_01_consensus_rules::Network;
use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Static configuration of a state engine instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub network: Network,
    /// Issuer of the native tokens; the only address that can grant them.
    pub genesis_issuer: Address,
}

impl EngineConfig {
    /// Defaults for a network.
    pub fn for_network(network: Network) -> Self {
        let genesis_issuer = match network {
            Network::Main => Address::from("oMainGenesisTreasury111111111111111"),
            Network::Test => Address::from("oTestGenesisTreasury111111111111111"),
            Network::Regtest => Address::from("oRegtestGenesisTreasury"),
        };

        Self {
            network,
            genesis_issuer,
        }
    }

    pub fn regtest() -> Self {
        Self::for_network(Network::Regtest)
    }
}
