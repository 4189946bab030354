//! Regtest smoke run: drives the engine through a few blocks of property
//! creation, trading and settlement, and prints the resulting consensus
//! hash. Useful for eyeballing the replay pipeline without a chain layer.

use anyhow::Result;
use node_runtime::{EngineConfig, StateEngine};
use shared_types::{
    Address, DexAction, Ecosystem, ParsedTx, PropertyData, TxHash, TxPayload, COIN,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn tx(n: u64, sender: &Address, payload: TxPayload) -> ParsedTx {
    ParsedTx::new(TxHash::from_low_u64_be(n), sender.clone(), 0, payload)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut engine = StateEngine::new(EngineConfig::regtest());
    let genesis = engine.current_block();

    let alice = Address::from("oAlice");
    let bob = Address::from("oBob");
    let hash = |height: u64| primitive_types::H256::from_low_u64_be(height);

    // block 1: Alice issues two fixed properties
    let block = genesis + 1;
    let (outcomes, _) = engine
        .apply_block(
            &[
                tx(
                    1,
                    &alice,
                    TxPayload::CreatePropertyFixed {
                        ecosystem: Ecosystem::Main,
                        divisible: true,
                        info: PropertyData::named("Quid"),
                        amount: 1_000 * COIN,
                    },
                ),
                tx(
                    2,
                    &alice,
                    TxPayload::CreatePropertyFixed {
                        ecosystem: Ecosystem::Main,
                        divisible: false,
                        info: PropertyData::named("Marker"),
                        amount: 500,
                    },
                ),
            ],
            block,
            &hash(block),
            1_000_000,
        )?;
    info!(?outcomes, "Block with issuances connected");

    // block 2: Alice shares Quid with Bob and posts a DEx offer
    let block = genesis + 2;
    engine
        .apply_block(
            &[
                tx(
                    3,
                    &alice,
                    TxPayload::SimpleSend {
                        recipient: bob.clone(),
                        property: 3,
                        amount: 250 * COIN,
                    },
                ),
                tx(
                    4,
                    &alice,
                    TxPayload::DexSellOffer {
                        property: 3,
                        amount_for_sale: 100 * COIN,
                        anchor_desired: 2 * COIN,
                        payment_window: 10,
                        min_accept_fee: 0,
                        action: DexAction::New,
                    },
                ),
            ],
            block,
            &hash(block),
            1_000_600,
        )?;

    // block 3: Bob accepts part of the offer and pays for it
    let block = genesis + 3;
    engine
        .apply_block(
            &[tx(
                5,
                &bob,
                TxPayload::DexAccept {
                    seller: alice.clone(),
                    property: 3,
                    amount: 40 * COIN,
                },
            )],
            block,
            &hash(block),
            1_001_200,
        )?;
    let settlements = engine.apply_dex_payment(&bob, &alice, 4 * COIN / 5)?;
    info!(?settlements, "Anchor payment settled");

    let summary = engine.end_block(genesis + 4, &hash(genesis + 4), 1_001_800)?;
    info!(
        height = summary.height,
        consensus_hash = %summary.consensus_hash,
        "Smoke run complete"
    );

    for address in [&alice, &bob] {
        for property in engine.get_property_ids_of(address) {
            let tally = engine.get_balance(address, property);
            info!(
                %address,
                property,
                available = tally.available,
                reserved = tally.reserved,
                "Final balance"
            );
        }
    }

    Ok(())
}
