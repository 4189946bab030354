//! Hardcoded consensus and transaction checkpoints.
//!
//! Consensus checkpoints pin the derived-state hash at fixed heights;
//! transaction checkpoints pin the existence of known historical layer
//! transactions. Both exist to surface state divergence early. Only mainnet
//! carries checkpoints.

use super::params::Network;
use primitive_types::H256;

/// Heights between consensus-hash verifications.
pub const CHECKPOINT_INTERVAL: u64 = 10_000;

/// A (height, anchor block hash, consensus hash) anchor for derived state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusCheckpoint {
    pub height: u64,
    pub block_hash: H256,
    pub consensus_hash: H256,
}

/// A historical layer transaction that must exist in processed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionCheckpoint {
    pub height: u64,
    pub txid: H256,
}

fn h256(hex: &str) -> H256 {
    hex.parse().expect("hardcoded checkpoint hash is valid hex")
}

/// Consensus checkpoints for the given network.
pub fn consensus_checkpoints(network: Network) -> Vec<ConsensusCheckpoint> {
    match network {
        Network::Main => vec![
            ConsensusCheckpoint {
                height: 4_020_000,
                block_hash: h256(
                    "0000000026736ec890b8b1df451e12de93d63cf33987acae4bf4add58d158bf9",
                ),
                consensus_hash: h256(
                    "b6503145f1cdc561c87cb3e1b8fccdf3e2dd182c35c1aab3840ef584d8841376",
                ),
            },
            ConsensusCheckpoint {
                height: 4_030_000,
                block_hash: h256(
                    "000000003afefa6963243fd0f968728c9ef887cf418bd21da2d273f60bab0b66",
                ),
                consensus_hash: h256(
                    "63e79dba25d4db0a920af8517746ad8eaf087a72e177047a12e01f9e3b15843a",
                ),
            },
        ],
        Network::Test | Network::Regtest => Vec::new(),
    }
}

/// Transaction-existence checkpoints for the given network.
pub fn transaction_checkpoints(network: Network) -> Vec<TransactionCheckpoint> {
    match network {
        Network::Main => vec![
            TransactionCheckpoint {
                height: 4_032_090,
                txid: h256("84c7eb3ced6c54340a839f046952f67787ca4f4e543ca145c3560d60da9b68f6"),
            },
            TransactionCheckpoint {
                height: 4_032_097,
                txid: h256("099dc32075d67212426d5139c47e17aa2bdcb23d1baabb7b29bae16471e303b1"),
            },
            TransactionCheckpoint {
                height: 4_032_249,
                txid: h256("3a0a1904722eba4e91918d53a0939b99e2ca1f8489fb05b87a7ab2f42724a0a2"),
            },
            TransactionCheckpoint {
                height: 4_032_249,
                txid: h256("bcc5f5b9574e1d1ed465f362f9d744adcc1a18f4cf80ebe497eb1571258eedba"),
            },
            TransactionCheckpoint {
                height: 4_032_252,
                txid: h256("94c2c694bf20eb6da98cdda52576734412df458844931a64aaad757335e5a8ef"),
            },
            TransactionCheckpoint {
                height: 4_032_553,
                txid: h256("e63f5a79b5003c0a88eb80b8165c673d28be83fd73055ec37563b4a32f22f26e"),
            },
        ],
        Network::Test | Network::Regtest => Vec::new(),
    }
}
