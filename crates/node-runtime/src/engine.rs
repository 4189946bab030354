//! The consensus state engine.
//!
//! Owns every piece of derived state and applies confirmed transactions to
//! it strictly in (block, position) order. All mutation goes through
//! [`StateEngine::apply_transaction`], [`StateEngine::apply_dex_payment`]
//! and [`StateEngine::end_block`]; everything else is a read.

use crate::config::EngineConfig;
use crate::errors::ConsensusError;
use ob_01_consensus_rules::{
    Alert, CompletedActivation, ConsensusContext, PendingActivation, CHECKPOINT_INTERVAL,
};
use ob_02_balance_ledger::{BalanceLedger, PropertyInfo, PropertyRegistry, Tally};
use ob_03_dex::{DexAccept, DexBook, SellOffer};
use ob_04_metadex::{MetaDexBook, MetaDexOrder};
use ob_05_crowdsale::{ClosedCrowdsale, Crowdsale, CrowdsaleRegistry};
use ob_06_fee_cache::{distribution_threshold, FeeCache, FeeDistribution};
use ob_07_consensus_hash::consensus_hash;
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use shared_types::{Address, BlockHash, PropertyId, TxHash};
use std::collections::BTreeSet;
use tracing::{error, info};

/// Everything `end_block` reports back to the chain layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub height: u64,
    pub consensus_hash: H256,
    /// DEx accepts that expired unpaid in this block.
    pub expired_accepts: usize,
    /// Crowdsales that hit their deadline in this block.
    pub closed_crowdsales: Vec<PropertyId>,
}

/// All derived consensus state of one network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateEngine {
    pub(crate) config: EngineConfig,
    pub(crate) ctx: ConsensusContext,
    pub(crate) ledger: BalanceLedger,
    pub(crate) registry: PropertyRegistry,
    pub(crate) dex: DexBook,
    pub(crate) metadex: MetaDexBook,
    pub(crate) crowdsales: CrowdsaleRegistry,
    pub(crate) fees: FeeCache,
    /// Hashes of validly processed layer transactions, for the existence
    /// checkpoints.
    pub(crate) processed_txs: BTreeSet<TxHash>,
    pub(crate) current_block: u64,
}

impl StateEngine {
    pub fn new(config: EngineConfig) -> Self {
        let ctx = ConsensusContext::new(config.network);
        let registry = PropertyRegistry::new(config.genesis_issuer.clone());
        let current_block = ctx.params().genesis_block;

        info!(network = ?config.network, genesis = current_block, "State engine initialized");
        Self {
            config,
            ctx,
            ledger: BalanceLedger::new(),
            registry,
            dex: DexBook::new(),
            metadex: MetaDexBook::new(),
            crowdsales: CrowdsaleRegistry::new(),
            fees: FeeCache::new(),
            processed_txs: BTreeSet::new(),
            current_block,
        }
    }

    pub fn regtest() -> Self {
        Self::new(EngineConfig::regtest())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &ConsensusContext {
        &self.ctx
    }

    pub fn current_block(&self) -> u64 {
        self.current_block
    }

    /// Finishes a connected block: expires DEx accepts, closes crowdsales
    /// past their deadline, promotes pending feature activations, expires
    /// alerts, then folds and verifies the consensus hash.
    ///
    /// A checkpoint mismatch or an unsupported live feature is fatal: the
    /// caller must halt the node instead of advancing past it.
    pub fn end_block(
        &mut self,
        height: u64,
        block_hash: &BlockHash,
        block_time: i64,
    ) -> Result<BlockSummary, ConsensusError> {
        let expired_accepts = self
            .dex
            .expire_accepts(&mut self.ledger, height)
            .map_err(|e| ConsensusError::Internal(e.to_string()))?;

        let closed_crowdsales = self.crowdsales.close_expired(block_time, height);

        self.ctx.promote_pending_activations(height);
        if let Some(feature) = self.ctx.unsupported_feature_live(height) {
            error!(?feature, height, "Activated feature is unsupported; halting");
            return Err(ConsensusError::UnsupportedFeature(feature));
        }
        self.ctx
            .expire_alerts(height, block_time.max(0) as u64);

        let consensus_hash = self.consensus_hash();
        self.ctx
            .verify_checkpoint(height, block_hash, &consensus_hash)
            .map_err(ConsensusError::Divergence)?;
        if height % CHECKPOINT_INTERVAL == 0 {
            self.ctx
                .verify_transaction_existence(height, |txid| self.processed_txs.contains(txid))
                .map_err(ConsensusError::Divergence)?;
        }

        self.current_block = height;
        Ok(BlockSummary {
            height,
            consensus_hash,
            expired_accepts,
            closed_crowdsales,
        })
    }

    /// Clears all derived state for a reorganization below `height` and
    /// returns the height replay must restart from. State is rebuilt
    /// deterministically by re-connecting blocks.
    pub fn rollback_to(&mut self, height: u64) -> u64 {
        info!(height, "Reorganization: clearing derived state for replay");
        *self = Self::new(self.config.clone());
        self.current_block
    }

    // ------------------------------------------------------------------
    // Read-only snapshot queries
    // ------------------------------------------------------------------

    /// The (available, reserved, frozen) balance of an address.
    pub fn get_balance(&self, address: &Address, property: PropertyId) -> Tally {
        self.ledger.get(address, property)
    }

    /// Ordered property ids held by an address.
    pub fn get_property_ids_of(&self, address: &Address) -> Vec<PropertyId> {
        self.ledger.properties_of(address)
    }

    /// All holders of a property with their full tallies, in address order.
    pub fn get_property_holders(&self, property: PropertyId) -> Vec<(Address, Tally)> {
        self.ledger
            .entries()
            .filter(|((_, held), _)| *held == property)
            .map(|((address, _), tally)| (address.clone(), *tally))
            .collect()
    }

    pub fn get_property(&self, property: PropertyId) -> Option<&PropertyInfo> {
        self.registry.get(property)
    }

    /// Resting MetaDEx orders selling `property_for_sale`.
    pub fn get_order_book(
        &self,
        property_for_sale: PropertyId,
        property_desired: Option<PropertyId>,
    ) -> Vec<&MetaDexOrder> {
        self.metadex.order_book(property_for_sale, property_desired)
    }

    /// Open DEx offers, optionally for one seller.
    pub fn get_active_dex_offers(&self, seller: Option<&Address>) -> Vec<&SellOffer> {
        self.dex.active_offers(seller)
    }

    /// Pending accepts against one offer.
    pub fn get_dex_accepts(&self, seller: &Address, property: PropertyId) -> Vec<&DexAccept> {
        self.dex.accepts_of(seller, property)
    }

    pub fn get_crowdsale(&self, property: PropertyId) -> Option<&Crowdsale> {
        self.crowdsales.get_active(property)
    }

    pub fn get_closed_crowdsale(&self, property: PropertyId) -> Option<&ClosedCrowdsale> {
        self.crowdsales.get_closed(property)
    }

    /// Collected fee units awaiting distribution for a property.
    pub fn get_fee_cache(&self, property: PropertyId) -> i64 {
        self.fees.cached(property)
    }

    /// Fee units required to trigger a distribution for a property.
    pub fn get_fee_trigger(&self, property: PropertyId) -> i64 {
        let supply = self
            .registry
            .get(property)
            .map(|info| info.total_supply)
            .unwrap_or(0);
        distribution_threshold(supply)
    }

    pub fn get_fee_distribution(&self, id: u64) -> Option<&FeeDistribution> {
        self.fees.distribution(id)
    }

    pub fn get_fee_distributions(&self, property: PropertyId) -> Vec<&FeeDistribution> {
        self.fees.distributions_for(property)
    }

    pub fn get_alerts(&self) -> &[Alert] {
        self.ctx.alerts()
    }

    pub fn get_pending_activations(&self) -> &[PendingActivation] {
        self.ctx.pending_activations()
    }

    pub fn get_completed_activations(&self) -> &[CompletedActivation] {
        self.ctx.completed_activations()
    }

    /// The digest over all derived state at this point of replay.
    pub fn consensus_hash(&self) -> H256 {
        consensus_hash(
            &self.ledger,
            &self.registry,
            &self.dex,
            &self.metadex,
            &self.crowdsales,
        )
    }

    /// Whether a layer transaction was processed as valid.
    pub fn has_processed(&self, txid: &TxHash) -> bool {
        self.processed_txs.contains(txid)
    }
}
