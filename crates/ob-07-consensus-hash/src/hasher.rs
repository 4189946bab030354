//! The state fold.
//!
//! Each record contributes one pipe-delimited line to the digest, section
//! by section: balances, DEx offers, DEx accepts, MetaDEx orders, active
//! crowdsales (with their contribution ledgers), then properties.

use ob_02_balance_ledger::{BalanceLedger, PropertyRegistry};
use ob_03_dex::DexBook;
use ob_04_metadex::MetaDexBook;
use ob_05_crowdsale::CrowdsaleRegistry;
use primitive_types::H256;
use sha2::{Digest, Sha256};
use shared_types::TxHash;

fn hash_line(hasher: &mut Sha256, line: &str) {
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
}

fn hex_of(txid: &TxHash) -> String {
    hex::encode(txid.as_bytes())
}

/// Digest over all derived consensus state.
pub fn consensus_hash(
    ledger: &BalanceLedger,
    registry: &PropertyRegistry,
    dex: &DexBook,
    metadex: &MetaDexBook,
    crowdsales: &CrowdsaleRegistry,
) -> H256 {
    let mut hasher = Sha256::new();

    for ((address, property), tally) in ledger.entries() {
        hash_line(
            &mut hasher,
            &format!(
                "{}|{}|{}|{}|{}",
                address, property, tally.available, tally.reserved, tally.frozen
            ),
        );
    }

    for offer in dex.offers() {
        hash_line(
            &mut hasher,
            &format!(
                "{}|{}|{}|{}|{}|{}|{}|{}",
                hex_of(&offer.txid),
                offer.seller,
                offer.property,
                offer.amount_original,
                offer.anchor_desired_original,
                offer.amount_remaining,
                offer.payment_window,
                offer.min_accept_fee
            ),
        );
    }

    for accept in dex.accepts() {
        hash_line(
            &mut hasher,
            &format!(
                "{}|{}|{}|{}|{}|{}",
                accept.seller,
                accept.buyer,
                accept.property,
                accept.amount_original,
                accept.amount_remaining,
                accept.accept_block
            ),
        );
    }

    for order in metadex.orders() {
        hash_line(
            &mut hasher,
            &format!(
                "{}|{}|{}|{}|{}|{}|{}|{}|{}",
                hex_of(&order.txid),
                order.address,
                order.property_for_sale,
                order.amount_for_sale,
                order.property_desired,
                order.amount_desired,
                order.amount_remaining,
                order.block,
                order.position
            ),
        );
    }

    for sale in crowdsales.active() {
        hash_line(
            &mut hasher,
            &format!(
                "{}|{}|{}|{}|{}|{}|{}",
                sale.property,
                sale.property_desired,
                sale.tokens_per_unit,
                sale.early_bird_bonus,
                sale.issuer_percentage,
                sale.deadline,
                sale.issuer
            ),
        );
        for (txid, contribution) in &sale.contributions {
            hash_line(
                &mut hasher,
                &format!(
                    "{}|{}|{}|{}|{}",
                    hex_of(txid),
                    contribution.amount_invested,
                    contribution.week_index,
                    contribution.participant_tokens,
                    contribution.issuer_tokens
                ),
            );
        }
    }

    for property in registry.properties() {
        hash_line(
            &mut hasher,
            &format!(
                "{}|{}|{}|{}",
                property.id,
                property.issuer,
                property.total_supply,
                u8::from(property.divisible)
            ),
        );
    }

    H256::from_slice(&hasher.finalize())
}
