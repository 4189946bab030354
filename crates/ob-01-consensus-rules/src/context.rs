//! The consensus rule context owned by the state engine.
//!
//! `ConsensusContext` bundles the per-network parameters with the mutable
//! rule state they accumulate over replay: pending and completed feature
//! activations and live alerts. It is a plain value constructed once per
//! network selection and passed by the engine into every rule decision;
//! there is no ambient global parameter state.

use crate::domain::alerts::{Alert, AlertType, ALERT_TYPE_CLEAR};
use crate::domain::checkpoints::{
    consensus_checkpoints, transaction_checkpoints, ConsensusCheckpoint, TransactionCheckpoint,
    CHECKPOINT_INTERVAL,
};
use crate::domain::errors::RulesError;
use crate::domain::features::Feature;
use crate::domain::params::{ConsensusParams, Network, BLOCK_NEVER};
use crate::version::{client_version, is_client_supported};
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use shared_types::{is_test_ecosystem_property, Address, PropertyId, TxHash, PROPERTY_ANCHOR};
use tracing::{debug, info, warn};

/// Source recorded on alerts the gate raises itself.
const INTERNAL_ALERT_SOURCE: &str = "obol-internal";

/// Blocks an emergency-deactivation alert stays visible.
const DEACTIVATION_ALERT_BLOCKS: u64 = 1_024;

/// A feature activation that has been announced but whose height has not
/// been reached yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingActivation {
    pub feature: Feature,
    pub activation_block: u64,
    pub min_client_version: u32,
}

/// A feature activation whose height has been reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedActivation {
    pub feature: Feature,
    pub activation_block: u64,
    pub min_client_version: u32,
}

/// Per-network consensus rule state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusContext {
    params: ConsensusParams,
    pending_activations: Vec<PendingActivation>,
    completed_activations: Vec<CompletedActivation>,
    alerts: Vec<Alert>,
}

impl ConsensusContext {
    pub fn new(network: Network) -> Self {
        Self {
            params: ConsensusParams::for_network(network),
            pending_activations: Vec::new(),
            completed_activations: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn pending_activations(&self) -> &[PendingActivation] {
        &self.pending_activations
    }

    pub fn completed_activations(&self) -> &[CompletedActivation] {
        &self.completed_activations
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Whether `sender` may issue alert/activation/deactivation
    /// transactions on this network.
    pub fn is_authorized_admin(&self, sender: &Address) -> bool {
        match &self.params.authorized_admin {
            Some(admin) => admin == sender,
            None => true,
        }
    }

    /// Whether a feature is live at the given block.
    pub fn is_feature_activated(&self, feature: Feature, block: u64) -> bool {
        block >= self.params.activation_height(feature)
    }

    /// Checks, if the transaction type and version is supported and enabled.
    ///
    /// In the test ecosystem, transaction types known to the client are
    /// allowed without height restriction. The anchor-coin wildcard property
    /// must be explicitly permitted by the matching row.
    pub fn is_transaction_type_allowed(
        &self,
        block: u64,
        property: PropertyId,
        tx_type: u16,
        version: u16,
    ) -> bool {
        for restriction in self.params.restrictions() {
            if restriction.tx_type != tx_type || restriction.version != version {
                continue;
            }
            if property == PROPERTY_ANCHOR && !restriction.allow_wildcard {
                continue;
            }
            if is_test_ecosystem_property(property) {
                return true;
            }
            if block >= restriction.activation_block {
                return true;
            }
        }

        false
    }

    /// Activates a feature at a specific block height.
    ///
    /// Activations are consensus breaking: the requested height must give
    /// the network at least `min_activation_blocks` and at most
    /// `max_activation_blocks` of notice. If this client is older than the
    /// required minimum version, a shutdown alert is scheduled for the
    /// activation height.
    pub fn activate_feature(
        &mut self,
        feature_id: u16,
        activation_block: u64,
        min_client_version: u32,
        tx_block: u64,
    ) -> Result<(), RulesError> {
        let feature = Feature::from_id(feature_id).ok_or(RulesError::UnknownFeature(feature_id))?;

        let min = tx_block + self.params.min_activation_blocks;
        let max = tx_block + self.params.max_activation_blocks;
        if activation_block < min || activation_block > max {
            debug!(
                feature = feature.name(),
                requested = activation_block,
                "Feature activation refused by notice checks"
            );
            return Err(RulesError::ActivationOutsideNoticeWindow {
                requested: activation_block,
                min,
                max,
            });
        }

        if self.is_feature_activated(feature, tx_block) {
            return Err(RulesError::FeatureAlreadyActive(feature_id));
        }

        *self.params.activation_slot_mut(feature) = activation_block;
        self.pending_activations.push(PendingActivation {
            feature,
            activation_block,
            min_client_version,
        });

        info!(
            feature = feature.name(),
            activation_block, "Feature activation processed"
        );

        if !is_client_supported(min_client_version) {
            warn!(
                feature = feature.name(),
                activation_block,
                min_client_version,
                "Unsupported feature activated; this client will be out of consensus"
            );
            self.put_alert(Alert::new(
                Address::from(INTERNAL_ALERT_SOURCE),
                AlertType::BlockExpiry,
                activation_block,
                format!(
                    "Your client must be updated and will shutdown at block {} (unsupported feature {} ('{}') activated)",
                    activation_block,
                    feature_id,
                    feature.name()
                ),
            ));
        }

        Ok(())
    }

    /// Deactivates a feature immediately.
    ///
    /// There is no notice period: deactivation is reserved for emergency
    /// rollback, requires no client upgrade and no user action.
    pub fn deactivate_feature(&mut self, feature_id: u16, tx_block: u64) -> Result<(), RulesError> {
        let feature = Feature::from_id(feature_id).ok_or(RulesError::UnknownFeature(feature_id))?;

        if !self.is_feature_activated(feature, tx_block) {
            return Err(RulesError::FeatureNotActive(feature_id));
        }

        *self.params.activation_slot_mut(feature) = BLOCK_NEVER;
        self.pending_activations.retain(|p| p.feature != feature);
        self.completed_activations.retain(|c| c.feature != feature);

        info!(feature = feature.name(), "Feature deactivation processed");

        self.put_alert(Alert::new(
            Address::from(INTERNAL_ALERT_SOURCE),
            AlertType::BlockExpiry,
            tx_block + DEACTIVATION_ALERT_BLOCKS,
            format!(
                "An emergency deactivation of feature ID {} ({}) has occurred",
                feature_id,
                feature.name()
            ),
        ));

        Ok(())
    }

    /// Moves pending activations whose height has been reached into the
    /// completed set. Called once per connected block.
    pub fn promote_pending_activations(&mut self, block: u64) {
        let (live, still_pending): (Vec<_>, Vec<_>) = self
            .pending_activations
            .drain(..)
            .partition(|p| p.activation_block <= block);

        self.pending_activations = still_pending;
        for pending in live {
            info!(
                feature = pending.feature.name(),
                activation_block = pending.activation_block,
                "Feature is now live"
            );
            self.completed_activations.push(CompletedActivation {
                feature: pending.feature,
                activation_block: pending.activation_block,
                min_client_version: pending.min_client_version,
            });
        }
    }

    /// A live feature this client does not implement, if any. The node must
    /// halt rather than process semantics it does not understand.
    pub fn unsupported_feature_live(&self, block: u64) -> Option<Feature> {
        self.completed_activations
            .iter()
            .find(|c| c.activation_block <= block && !is_client_supported(c.min_client_version))
            .map(|c| c.feature)
    }

    /// Records an alert from an administrative source. Alert type 0 clears
    /// the sender's current alert.
    pub fn process_alert(
        &mut self,
        sender: &Address,
        alert_type: u16,
        expiry: u64,
        message: String,
    ) -> Result<(), RulesError> {
        if !self.is_authorized_admin(sender) {
            return Err(RulesError::UnauthorizedSender(sender.to_string()));
        }

        if alert_type == ALERT_TYPE_CLEAR {
            self.alerts.retain(|a| &a.source != sender);
            info!(source = %sender, "Alerts cleared");
            return Ok(());
        }

        let parsed =
            AlertType::from_wire(alert_type).ok_or(RulesError::InvalidAlertType(alert_type))?;
        info!(source = %sender, ?parsed, expiry, "Alert recorded");
        self.put_alert(Alert::new(sender.clone(), parsed, expiry, message));

        Ok(())
    }

    /// Drops alerts whose expiry condition is met.
    pub fn expire_alerts(&mut self, block: u64, block_time: u64) {
        self.alerts
            .retain(|a| !a.is_expired(block, block_time, client_version()));
    }

    /// Compares a block and consensus hash against the hardcoded checkpoint
    /// list. Off the checkpoint grid this is a no-op; on it, any mismatch is
    /// a hard failure the caller must treat as fatal.
    pub fn verify_checkpoint(
        &self,
        block: u64,
        block_hash: &H256,
        consensus_hash: &H256,
    ) -> Result<(), RulesError> {
        if block % CHECKPOINT_INTERVAL != 0 {
            return Ok(());
        }

        for checkpoint in self.consensus_checkpoints() {
            if checkpoint.height != block {
                continue;
            }

            if &checkpoint.block_hash != block_hash {
                return Err(RulesError::CheckpointBlockHashMismatch {
                    height: block,
                    expected: hex::encode(checkpoint.block_hash),
                    actual: hex::encode(block_hash),
                });
            }

            if &checkpoint.consensus_hash != consensus_hash {
                return Err(RulesError::CheckpointConsensusHashMismatch {
                    height: block,
                    expected: hex::encode(checkpoint.consensus_hash),
                    actual: hex::encode(consensus_hash),
                });
            }

            debug!(block, "Consensus checkpoint verified");
            break;
        }

        Ok(())
    }

    /// Checks that every checkpointed historical transaction up to `block`
    /// exists in processed state.
    pub fn verify_transaction_existence<F>(&self, block: u64, exists: F) -> Result<(), RulesError>
    where
        F: Fn(&TxHash) -> bool,
    {
        for checkpoint in self.transaction_checkpoints() {
            if checkpoint.height > block {
                continue;
            }
            if !exists(&checkpoint.txid) {
                return Err(RulesError::MissingCheckpointTransaction {
                    height: checkpoint.height,
                    txid: checkpoint.txid,
                });
            }
        }

        Ok(())
    }

    pub fn consensus_checkpoints(&self) -> Vec<ConsensusCheckpoint> {
        consensus_checkpoints(self.params.network)
    }

    pub fn transaction_checkpoints(&self) -> Vec<TransactionCheckpoint> {
        transaction_checkpoints(self.params.network)
    }

    fn put_alert(&mut self, alert: Alert) {
        self.alerts.retain(|a| a.source != alert.source);
        self.alerts.push(alert);
    }
}
