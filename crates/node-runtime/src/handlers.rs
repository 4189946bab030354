//! Transaction dispatch and per-type handlers.
//!
//! `apply_transaction` is the single mutation entry point for layer
//! transactions: the activation gate authorizes the (type, version) pair
//! first, then the matching handler validates and applies the payload.
//! A handler error rejects the transaction with no state mutated for it;
//! the block goes on with the next transaction.

use crate::engine::{BlockSummary, StateEngine};
use crate::errors::{ConsensusError, ProcessingError};
use ob_01_consensus_rules::{Feature, RulesError};
use ob_02_balance_ledger::{BalanceBucket, LedgerError, PropertyInfo};
use ob_03_dex::{DexError, DexSettlement};
use ob_04_metadex::MetaDexOrder;
use ob_05_crowdsale::{
    calculate_fundraiser_tokens, CloseReason, Contribution, Crowdsale, CrowdsaleError,
};
use shared_types::{
    is_native_token, same_ecosystem, Address, BlockHash, DexAction, Ecosystem, ParsedTx,
    PropertyData, PropertyId, TxHash, TxOutcome, TxPayload,
};
use tracing::{debug, info, warn};

/// Divisor of the taker-side trade fee on non-native pairs (0.05%).
const TRADE_FEE_DIVISOR: i64 = 2_000;

impl StateEngine {
    /// Applies every transaction of a block in position order, then runs
    /// the block-end work. Per-transaction failures are collected, not
    /// propagated; only consensus-fatal conditions error.
    pub fn apply_block(
        &mut self,
        txs: &[ParsedTx],
        height: u64,
        block_hash: &BlockHash,
        block_time: i64,
    ) -> Result<(Vec<Result<TxOutcome, ProcessingError>>, BlockSummary), ConsensusError> {
        let outcomes = txs
            .iter()
            .enumerate()
            .map(|(position, tx)| {
                let outcome = self.apply_transaction(tx, height, block_time, position as u32);
                if let Err(reason) = &outcome {
                    warn!(txid = %tx.txid, %reason, "Transaction rejected");
                }
                outcome
            })
            .collect();

        let summary = self.end_block(height, block_hash, block_time)?;
        Ok((outcomes, summary))
    }

    /// Applies one confirmed transaction.
    pub fn apply_transaction(
        &mut self,
        tx: &ParsedTx,
        block: u64,
        block_time: i64,
        position: u32,
    ) -> Result<TxOutcome, ProcessingError> {
        let tx_type = tx.tx_type();
        let gating_property = tx.payload.gating_property();
        if !self
            .ctx
            .is_transaction_type_allowed(block, gating_property, tx_type, tx.version)
        {
            return Err(ProcessingError::TypeNotAllowed {
                tx_type,
                version: tx.version,
                block,
            });
        }

        debug!(txid = %tx.txid, tx_type, block, position, "Applying transaction");
        let sender = &tx.sender;
        let outcome = match &tx.payload {
            TxPayload::SimpleSend {
                recipient,
                property,
                amount,
            } => self.simple_send(sender, recipient, *property, *amount, tx.txid, block, block_time),
            TxPayload::SendToOwners {
                property,
                amount,
                distribution_property,
            } => self.send_to_owners(sender, *property, *amount, *distribution_property),
            TxPayload::SendAll {
                recipient,
                ecosystem,
            } => self.send_all(sender, recipient, *ecosystem),
            TxPayload::DexSellOffer {
                property,
                amount_for_sale,
                anchor_desired,
                payment_window,
                min_accept_fee,
                action,
            } => self.dex_sell_offer(
                sender,
                *property,
                *amount_for_sale,
                *anchor_desired,
                *payment_window,
                *min_accept_fee,
                *action,
                tx.txid,
            ),
            TxPayload::DexAccept {
                seller,
                property,
                amount,
            } => self.dex_accept(sender, seller, *property, *amount, tx.fee, block),
            TxPayload::MetaDexTrade {
                property_for_sale,
                amount_for_sale,
                property_desired,
                amount_desired,
            } => self.metadex_trade(
                sender,
                *property_for_sale,
                *amount_for_sale,
                *property_desired,
                *amount_desired,
                tx.txid,
                block,
                position,
            ),
            TxPayload::MetaDexCancelPrice {
                property_for_sale,
                amount_for_sale,
                property_desired,
                amount_desired,
            } => {
                let released = self.metadex.cancel_at_price(
                    &mut self.ledger,
                    sender,
                    *property_for_sale,
                    *amount_for_sale,
                    *property_desired,
                    *amount_desired,
                )?;
                debug!(%sender, released, "Cancel-at-price processed");
                Ok(TxOutcome::Applied)
            }
            TxPayload::MetaDexCancelPair {
                property_for_sale,
                property_desired,
            } => {
                let released = self.metadex.cancel_pair(
                    &mut self.ledger,
                    sender,
                    *property_for_sale,
                    *property_desired,
                )?;
                debug!(%sender, released, "Cancel-by-pair processed");
                Ok(TxOutcome::Applied)
            }
            TxPayload::MetaDexCancelEcosystem { ecosystem } => {
                let released =
                    self.metadex
                        .cancel_ecosystem(&mut self.ledger, sender, *ecosystem)?;
                debug!(%sender, released, "Cancel-by-ecosystem processed");
                Ok(TxOutcome::Applied)
            }
            TxPayload::CreatePropertyFixed {
                ecosystem,
                divisible,
                info,
                amount,
            } => self.create_property_fixed(sender, *ecosystem, *divisible, info, *amount, tx.txid),
            TxPayload::CreateCrowdsale {
                ecosystem,
                divisible,
                info,
                property_desired,
                tokens_per_unit,
                deadline,
                early_bird_bonus,
                issuer_percentage,
            } => self.create_crowdsale(
                sender,
                *ecosystem,
                *divisible,
                info,
                *property_desired,
                *tokens_per_unit,
                *deadline,
                *early_bird_bonus,
                *issuer_percentage,
                tx.txid,
                block_time,
            ),
            TxPayload::CloseCrowdsale { property } => {
                self.close_crowdsale(sender, *property, tx.txid, block)
            }
            TxPayload::CreatePropertyManaged {
                ecosystem,
                divisible,
                info,
            } => self.create_property_managed(sender, *ecosystem, *divisible, info, tx.txid),
            TxPayload::GrantTokens {
                recipient,
                property,
                amount,
            } => self.grant_tokens(sender, recipient, *property, *amount),
            TxPayload::RevokeTokens { property, amount } => {
                self.revoke_tokens(sender, *property, *amount)
            }
            TxPayload::ChangeIssuer {
                recipient,
                property,
            } => self.change_issuer(sender, recipient, *property),
            TxPayload::EnableFreezing { property } => {
                self.registry.require_managed(*property)?;
                self.registry.require_issuer(*property, sender)?;
                self.registry.enable_freezing(*property, block)?;
                info!(property, block, "Freezing enabled");
                Ok(TxOutcome::Applied)
            }
            TxPayload::DisableFreezing { property } => {
                self.registry.require_managed(*property)?;
                self.registry.require_issuer(*property, sender)?;
                self.registry.disable_freezing(*property)?;
                info!(property, "Freezing disabled");
                Ok(TxOutcome::Applied)
            }
            TxPayload::FreezeTokens { target, property } => {
                self.freeze_tokens(sender, target, *property, block)
            }
            TxPayload::UnfreezeTokens { target, property } => {
                self.unfreeze_tokens(sender, target, *property)
            }
            TxPayload::FeatureActivation {
                feature_id,
                activation_block,
                min_client_version,
            } => {
                self.require_admin(sender)?;
                self.ctx.activate_feature(
                    *feature_id,
                    *activation_block,
                    *min_client_version,
                    block,
                )?;
                Ok(TxOutcome::Applied)
            }
            TxPayload::FeatureDeactivation { feature_id } => {
                self.require_admin(sender)?;
                self.ctx.deactivate_feature(*feature_id, block)?;
                Ok(TxOutcome::Applied)
            }
            TxPayload::Alert {
                alert_type,
                expiry,
                message,
            } => {
                self.ctx
                    .process_alert(sender, *alert_type, *expiry, message.clone())?;
                Ok(TxOutcome::Applied)
            }
        }?;

        self.processed_txs.insert(tx.txid);
        Ok(outcome)
    }

    /// Settles an observed anchor-coin payment against pending accepts.
    /// Not a layer transaction: the chain layer reports qualifying coin
    /// transfers from buyer to seller here.
    pub fn apply_dex_payment(
        &mut self,
        buyer: &Address,
        seller: &Address,
        amount_paid: i64,
    ) -> Result<Vec<DexSettlement>, ProcessingError> {
        Ok(self.dex.pay(&mut self.ledger, buyer, seller, amount_paid)?)
    }

    // ------------------------------------------------------------------
    // Sends
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn simple_send(
        &mut self,
        sender: &Address,
        recipient: &Address,
        property: PropertyId,
        amount: i64,
        txid: TxHash,
        block: u64,
        block_time: i64,
    ) -> Result<TxOutcome, ProcessingError> {
        if amount <= 0 {
            return Err(ProcessingError::InvalidAmount(amount));
        }
        self.registry.require(property)?;
        self.ensure_not_frozen(property, sender)?;
        self.ensure_not_frozen(property, recipient)?;

        // a send of the desired property to a crowdsale issuer participates
        // in the sale
        let sale_hit = self
            .crowdsales
            .active_for_issuer(recipient, property)
            .map(|sale| (sale.property, sale.issuer.clone()));
        if let Some((sale_property, sale_issuer)) = sale_hit {
            let crossover_blocked = self
                .ctx
                .is_feature_activated(Feature::CrowdsaleCrossover, block)
                && !same_ecosystem(sale_property, property);
            if sender != &sale_issuer && !crossover_blocked {
                return self.crowdsale_contribution(
                    sender,
                    sale_property,
                    amount,
                    txid,
                    block,
                    block_time,
                );
            }
        }

        self.ledger.transfer(sender, recipient, property, amount)?;
        debug!(%sender, %recipient, property, amount, "Simple send applied");
        Ok(TxOutcome::Applied)
    }

    fn send_to_owners(
        &mut self,
        sender: &Address,
        property: PropertyId,
        amount: i64,
        distribution_property: PropertyId,
    ) -> Result<TxOutcome, ProcessingError> {
        if amount <= 0 {
            return Err(ProcessingError::InvalidAmount(amount));
        }
        self.registry.require(property)?;
        self.registry.require(distribution_property)?;
        self.ensure_not_frozen(property, sender)?;

        let owners: Vec<_> = self
            .ledger
            .owners_of(distribution_property)
            .into_iter()
            .filter(|(address, _)| address != sender)
            .filter(|(address, _)| !self.registry.is_frozen(property, address))
            .collect();
        if owners.is_empty() {
            return Err(ProcessingError::NoOwners(distribution_property));
        }

        let total_weight: i128 = owners.iter().map(|(_, weight)| *weight as i128).sum();
        let shares: Vec<_> = owners
            .iter()
            .filter_map(|(address, weight)| {
                let share = ((amount as i128) * (*weight as i128) / total_weight) as i64;
                (share > 0).then(|| (address.clone(), share))
            })
            .collect();
        let distributed: i64 = shares.iter().map(|(_, share)| share).sum();
        if distributed == 0 {
            return Err(ProcessingError::NoOwners(distribution_property));
        }

        // the undistributed floor-division remainder stays with the sender
        self.ledger
            .debit(sender, property, BalanceBucket::Available, distributed)?;
        for (address, share) in &shares {
            self.ledger
                .credit(address, property, BalanceBucket::Available, *share)?;
        }

        info!(
            %sender,
            property,
            distribution_property,
            distributed,
            recipients = shares.len(),
            "Send-to-owners applied"
        );
        Ok(TxOutcome::Applied)
    }

    fn send_all(
        &mut self,
        sender: &Address,
        recipient: &Address,
        ecosystem: Ecosystem,
    ) -> Result<TxOutcome, ProcessingError> {
        let mut moved = 0usize;
        for property in self.ledger.properties_of(sender) {
            if Ecosystem::of(property) != ecosystem {
                continue;
            }
            if self.registry.is_frozen(property, sender)
                || self.registry.is_frozen(property, recipient)
            {
                continue;
            }
            let available = self.ledger.get(sender, property).available;
            if available > 0 {
                self.ledger.transfer(sender, recipient, property, available)?;
                moved += 1;
            }
        }

        if moved == 0 {
            return Err(ProcessingError::NothingToTransfer);
        }
        info!(%sender, %recipient, %ecosystem, properties = moved, "Send-all applied");
        Ok(TxOutcome::Applied)
    }

    // ------------------------------------------------------------------
    // DEx
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn dex_sell_offer(
        &mut self,
        sender: &Address,
        property: PropertyId,
        amount_for_sale: i64,
        anchor_desired: i64,
        payment_window: u8,
        min_accept_fee: i64,
        action: DexAction,
        txid: TxHash,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require(property)?;

        match action {
            DexAction::New => {
                self.ensure_not_frozen(property, sender)?;
                self.dex.post_offer(
                    &mut self.ledger,
                    txid,
                    sender,
                    property,
                    amount_for_sale,
                    anchor_desired,
                    payment_window,
                    min_accept_fee,
                )?;
            }
            DexAction::Update => {
                self.ensure_not_frozen(property, sender)?;
                self.dex.update_offer(
                    &mut self.ledger,
                    txid,
                    sender,
                    property,
                    amount_for_sale,
                    anchor_desired,
                    payment_window,
                    min_accept_fee,
                )?;
            }
            DexAction::Cancel => {
                self.dex.cancel_offer(&mut self.ledger, sender, property)?;
            }
        }

        Ok(TxOutcome::Applied)
    }

    fn dex_accept(
        &mut self,
        buyer: &Address,
        seller: &Address,
        property: PropertyId,
        amount: i64,
        fee_paid: i64,
        block: u64,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require(property)?;
        let offer = self
            .dex
            .offer(seller, property)
            .ok_or_else(|| DexError::OfferNotFound {
                seller: seller.clone(),
                property,
            })?;
        if fee_paid < offer.min_accept_fee {
            return Err(ProcessingError::FeeBelowMinimum {
                paid: fee_paid,
                required: offer.min_accept_fee,
            });
        }

        self.dex.accept_offer(buyer, seller, property, amount, block)?;
        Ok(TxOutcome::Applied)
    }

    // ------------------------------------------------------------------
    // MetaDEx
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn metadex_trade(
        &mut self,
        sender: &Address,
        property_for_sale: PropertyId,
        amount_for_sale: i64,
        property_desired: PropertyId,
        amount_desired: i64,
        txid: TxHash,
        block: u64,
        position: u32,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require(property_for_sale)?;
        self.registry.require(property_desired)?;
        if !same_ecosystem(property_for_sale, property_desired) {
            return Err(ProcessingError::CrossEcosystem(
                property_for_sale,
                property_desired,
            ));
        }

        let native_pair =
            is_native_token(property_for_sale) || is_native_token(property_desired);
        if !native_pair && !self.ctx.is_feature_activated(Feature::TradeAllPairs, block) {
            return Err(ProcessingError::NonNativePair(
                property_for_sale,
                property_desired,
            ));
        }
        self.ensure_not_frozen(property_for_sale, sender)?;

        let round_up = self.ctx.is_feature_activated(Feature::DexMath, block);
        let charge_fee =
            !native_pair && self.ctx.is_feature_activated(Feature::Fees, block);

        let order = MetaDexOrder {
            txid,
            address: sender.clone(),
            property_for_sale,
            amount_for_sale,
            property_desired,
            amount_desired,
            amount_remaining: amount_for_sale,
            block,
            position,
        };
        let result = self.metadex.trade(
            &mut self.ledger,
            order,
            round_up,
            charge_fee.then_some(TRADE_FEE_DIVISOR),
        )?;

        if result.fee_collected > 0 {
            self.collect_trade_fee(property_desired, result.fee_collected, block)?;
        }

        Ok(TxOutcome::Traded {
            fills: result.matches.len() as u32,
            rested: result.amount_rested > 0,
        })
    }

    /// Books a collected trade fee and runs a distribution if the cache
    /// crossed the property's threshold.
    fn collect_trade_fee(
        &mut self,
        property: PropertyId,
        amount: i64,
        block: u64,
    ) -> Result<(), ProcessingError> {
        self.fees.add_fee(property, amount)?;

        let supply = self.registry.require(property)?.total_supply;
        if !self.fees.should_distribute(property, supply) {
            return Ok(());
        }

        let native = Ecosystem::of(property).native_token();
        let owners = self.ledger.owners_of(native);
        if let Some(distribution) = self.fees.distribute(property, block, &owners) {
            for (address, share) in &distribution.recipients {
                self.ledger
                    .credit(address, property, BalanceBucket::Available, *share)?;
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Property management
    // ------------------------------------------------------------------

    fn create_property_fixed(
        &mut self,
        sender: &Address,
        ecosystem: Ecosystem,
        divisible: bool,
        info: &PropertyData,
        amount: i64,
        txid: TxHash,
    ) -> Result<TxOutcome, ProcessingError> {
        if amount <= 0 {
            return Err(ProcessingError::InvalidAmount(amount));
        }
        let property = self.create_property(
            sender, ecosystem, divisible, info, txid, false, None, amount,
        )?;
        self.ledger
            .credit(sender, property, BalanceBucket::Available, amount)?;
        Ok(TxOutcome::PropertyCreated(property))
    }

    #[allow(clippy::too_many_arguments)]
    fn create_crowdsale(
        &mut self,
        sender: &Address,
        ecosystem: Ecosystem,
        divisible: bool,
        info: &PropertyData,
        property_desired: PropertyId,
        tokens_per_unit: i64,
        deadline: i64,
        early_bird_bonus: u8,
        issuer_percentage: u8,
        txid: TxHash,
        block_time: i64,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require(property_desired)?;
        if Ecosystem::of(property_desired) != ecosystem {
            return Err(ProcessingError::CrossEcosystem(
                property_desired,
                ecosystem.native_token(),
            ));
        }
        if deadline <= block_time {
            return Err(ProcessingError::DeadlineInPast(deadline));
        }

        let property = self.create_property(
            sender,
            ecosystem,
            divisible,
            info,
            txid,
            false,
            Some(property_desired),
            0,
        )?;
        self.crowdsales.open(Crowdsale {
            property,
            property_desired,
            tokens_per_unit,
            early_bird_bonus,
            issuer_percentage,
            start_time: block_time,
            deadline,
            issuer: sender.clone(),
            txid,
            contributions: Default::default(),
        })?;

        Ok(TxOutcome::PropertyCreated(property))
    }

    fn create_property_managed(
        &mut self,
        sender: &Address,
        ecosystem: Ecosystem,
        divisible: bool,
        info: &PropertyData,
        txid: TxHash,
    ) -> Result<TxOutcome, ProcessingError> {
        let property =
            self.create_property(sender, ecosystem, divisible, info, txid, true, None, 0)?;
        Ok(TxOutcome::PropertyCreated(property))
    }

    #[allow(clippy::too_many_arguments)]
    fn create_property(
        &mut self,
        sender: &Address,
        ecosystem: Ecosystem,
        divisible: bool,
        info: &PropertyData,
        txid: TxHash,
        managed: bool,
        crowdsale_desired: Option<PropertyId>,
        total_supply: i64,
    ) -> Result<PropertyId, ProcessingError> {
        if info.name.is_empty() {
            return Err(ProcessingError::EmptyPropertyName);
        }

        Ok(self.registry.create(
            ecosystem,
            PropertyInfo {
                id: 0,
                name: info.name.clone(),
                category: info.category.clone(),
                subcategory: info.subcategory.clone(),
                url: info.url.clone(),
                data: info.data.clone(),
                divisible,
                issuer: sender.clone(),
                managed,
                crowdsale_desired,
                freezing_enabled: false,
                freezing_enabled_block: None,
                creation_txid: txid,
                total_supply,
            },
        ))
    }

    fn close_crowdsale(
        &mut self,
        sender: &Address,
        property: PropertyId,
        txid: TxHash,
        block: u64,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require_issuer(property, sender)?;
        self.crowdsales
            .close(property, CloseReason::CloseTransaction(txid), block)?;
        Ok(TxOutcome::Applied)
    }

    fn grant_tokens(
        &mut self,
        sender: &Address,
        recipient: &Address,
        property: PropertyId,
        amount: i64,
    ) -> Result<TxOutcome, ProcessingError> {
        if amount <= 0 {
            return Err(ProcessingError::InvalidAmount(amount));
        }
        self.registry.require_managed(property)?;
        self.registry.require_issuer(property, sender)?;
        self.ensure_not_frozen(property, recipient)?;

        self.registry.adjust_supply(property, amount)?;
        self.ledger
            .credit(recipient, property, BalanceBucket::Available, amount)?;

        info!(%sender, %recipient, property, amount, "Tokens granted");
        Ok(TxOutcome::Applied)
    }

    fn revoke_tokens(
        &mut self,
        sender: &Address,
        property: PropertyId,
        amount: i64,
    ) -> Result<TxOutcome, ProcessingError> {
        if amount <= 0 {
            return Err(ProcessingError::InvalidAmount(amount));
        }
        self.registry.require_managed(property)?;
        self.registry.require_issuer(property, sender)?;

        self.ledger
            .debit(sender, property, BalanceBucket::Available, amount)?;
        self.registry.adjust_supply(property, -amount)?;

        info!(%sender, property, amount, "Tokens revoked");
        Ok(TxOutcome::Applied)
    }

    fn change_issuer(
        &mut self,
        sender: &Address,
        recipient: &Address,
        property: PropertyId,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require_issuer(property, sender)?;
        self.registry.require_mut(property)?.issuer = recipient.clone();

        info!(property, old = %sender, new = %recipient, "Issuer changed");
        Ok(TxOutcome::Applied)
    }

    fn freeze_tokens(
        &mut self,
        sender: &Address,
        target: &Address,
        property: PropertyId,
        block: u64,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require_managed(property)?;
        let info = self.registry.require_issuer(property, sender)?;
        if !info.freezing_enabled {
            return Err(LedgerError::FreezingNotEnabled(property).into());
        }

        // the waiting period between enabling freezing and freezing only
        // binds once the notice feature is live
        if self.ctx.is_feature_activated(Feature::FreezeNotice, block) {
            let enabled_block = info.freezing_enabled_block.unwrap_or(0);
            let until = enabled_block + self.ctx.params().freeze_wait_period;
            if block < until {
                return Err(ProcessingError::FreezeWaitActive { property, until });
            }
        }

        self.registry.freeze(property, target)?;
        let available = self.ledger.get(target, property).available;
        if available > 0 {
            self.ledger.move_between(
                target,
                property,
                BalanceBucket::Available,
                BalanceBucket::Frozen,
                available,
            )?;
        }

        info!(%target, property, frozen = available, "Address frozen");
        Ok(TxOutcome::Applied)
    }

    fn unfreeze_tokens(
        &mut self,
        sender: &Address,
        target: &Address,
        property: PropertyId,
    ) -> Result<TxOutcome, ProcessingError> {
        self.registry.require_managed(property)?;
        self.registry.require_issuer(property, sender)?;

        self.registry.unfreeze(property, target)?;
        let frozen = self.ledger.get(target, property).frozen;
        if frozen > 0 {
            self.ledger.move_between(
                target,
                property,
                BalanceBucket::Frozen,
                BalanceBucket::Available,
                frozen,
            )?;
        }

        info!(%target, property, released = frozen, "Address unfrozen");
        Ok(TxOutcome::Applied)
    }

    // ------------------------------------------------------------------
    // Crowdsale participation
    // ------------------------------------------------------------------

    fn crowdsale_contribution(
        &mut self,
        contributor: &Address,
        sale_property: PropertyId,
        amount_invested: i64,
        txid: TxHash,
        block: u64,
        block_time: i64,
    ) -> Result<TxOutcome, ProcessingError> {
        let sale = self
            .crowdsales
            .get_active(sale_property)
            .ok_or(CrowdsaleError::NotActive(sale_property))?;
        let issuer = sale.issuer.clone();
        let property_desired = sale.property_desired;
        let deadline = sale.deadline;
        let tokens_per_unit = sale.tokens_per_unit;
        let early_bird_bonus = sale.early_bird_bonus;
        let issuer_percentage = sale.issuer_percentage;
        let weeks = sale.weeks_elapsed(block_time);
        let minted_so_far = sale.tokens_minted();

        // a contribution arriving past the deadline closes the sale; the
        // transfer still happens, nothing is minted
        if block_time >= deadline {
            self.ledger
                .transfer(contributor, &issuer, property_desired, amount_invested)?;
            self.crowdsales
                .close(sale_property, CloseReason::DeadlinePassed, block)?;
            return Ok(TxOutcome::Applied);
        }

        let invested_divisible = self.registry.require(property_desired)?.divisible;
        let grant_issuer_bonus = !self.ctx.is_feature_activated(Feature::GrantEffects, block);
        let grant = calculate_fundraiser_tokens(
            amount_invested,
            invested_divisible,
            tokens_per_unit,
            early_bird_bonus,
            weeks,
            issuer_percentage,
            minted_so_far,
            grant_issuer_bonus,
        );

        self.ledger
            .transfer(contributor, &issuer, property_desired, amount_invested)?;
        self.registry.adjust_supply(
            sale_property,
            grant.participant_tokens + grant.issuer_tokens,
        )?;
        self.ledger.credit(
            contributor,
            sale_property,
            BalanceBucket::Available,
            grant.participant_tokens,
        )?;
        if grant.issuer_tokens > 0 {
            self.ledger.credit(
                &issuer,
                sale_property,
                BalanceBucket::Available,
                grant.issuer_tokens,
            )?;
        }
        self.crowdsales.record_contribution(
            sale_property,
            txid,
            Contribution {
                contributor: contributor.clone(),
                amount_invested,
                week_index: weeks,
                participant_tokens: grant.participant_tokens,
                issuer_tokens: grant.issuer_tokens,
            },
        )?;

        info!(
            %contributor,
            sale_property,
            amount_invested,
            participant_tokens = grant.participant_tokens,
            issuer_tokens = grant.issuer_tokens,
            "Crowdsale contribution recorded"
        );

        if grant.capped {
            self.crowdsales
                .close(sale_property, CloseReason::MaxTokensReached, block)?;
        }

        Ok(TxOutcome::Applied)
    }

    // ------------------------------------------------------------------
    // Shared checks
    // ------------------------------------------------------------------

    fn require_admin(&self, sender: &Address) -> Result<(), ProcessingError> {
        if !self.ctx.is_authorized_admin(sender) {
            return Err(RulesError::UnauthorizedSender(sender.to_string()).into());
        }
        Ok(())
    }

    fn ensure_not_frozen(
        &self,
        property: PropertyId,
        address: &Address,
    ) -> Result<(), ProcessingError> {
        if self.registry.is_frozen(property, address) {
            return Err(LedgerError::SenderFrozen {
                property,
                address: address.clone(),
            }
            .into());
        }
        Ok(())
    }
}
