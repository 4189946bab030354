//! Crowdsale lifecycle through the engine.

use crate::integration::support::*;
use node_runtime::StateEngine;
use ob_05_crowdsale::{CloseReason, SECONDS_PER_WEEK};
use shared_types::{Ecosystem, TxPayload};

const START: i64 = 1_000_000;

/// Engine with property 3 ("Quid", 100k units held by oWhale) and an open
/// crowdsale selling property 4 ("Spark") for Quid at 100/unit, 2%/week
/// bonus, 10% issuer bonus, ten-week deadline.
fn engine_with_open_sale() -> StateEngine {
    let mut engine = StateEngine::regtest();
    let height = GENESIS + 1;

    let txs = vec![
        tx(
            1,
            "oWhale",
            TxPayload::CreatePropertyFixed {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Quid"),
                amount: 100_000,
            },
        ),
        tx(
            2,
            "oFounder",
            TxPayload::CreateCrowdsale {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Spark"),
                property_desired: 3,
                tokens_per_unit: 100,
                deadline: START + 10 * SECONDS_PER_WEEK,
                early_bird_bonus: 2,
                issuer_percentage: 10,
            },
        ),
    ];
    let (outcomes, _) = engine
        .apply_block(&txs, height, &block_hash(height), START)
        .expect("setup block");
    assert!(outcomes.iter().all(|o| o.is_ok()));
    engine
}

#[test]
fn contribution_mints_with_elapsed_week_bonus() {
    let mut engine = engine_with_open_sale();
    let height = GENESIS + 2;

    // week 3: 10 * 100 * (1 + 0.02 * 3) = 1060 participant tokens
    let contribution_time = START + 3 * SECONDS_PER_WEEK;
    engine
        .apply_transaction(
            &tx(
                3,
                "oWhale",
                TxPayload::SimpleSend {
                    recipient: addr("oFounder"),
                    property: 3,
                    amount: 10,
                },
            ),
            height,
            contribution_time,
            0,
        )
        .expect("contribution");

    assert_eq!(engine.get_balance(&addr("oWhale"), 4).available, 1_060);
    assert_eq!(engine.get_balance(&addr("oFounder"), 4).available, 106);
    // invested funds landed with the issuer
    assert_eq!(engine.get_balance(&addr("oFounder"), 3).available, 10);
    assert_conserved(&engine, 4);

    let sale = engine.get_crowdsale(4).expect("active");
    let record = &sale.contributions[&txid(3)];
    assert_eq!(record.week_index, 3);
    assert_eq!(record.amount_invested, 10);
    assert_eq!(record.participant_tokens, 1_060);
    assert_eq!(record.issuer_tokens, 106);
}

#[test]
fn deadline_closes_the_sale_at_block_end() {
    let mut engine = engine_with_open_sale();
    let height = GENESIS + 2;

    let summary = engine
        .end_block(height, &block_hash(height), START + 10 * SECONDS_PER_WEEK)
        .expect("deadline block");

    assert_eq!(summary.closed_crowdsales, vec![4]);
    assert!(engine.get_crowdsale(4).is_none());
    assert_eq!(
        engine.get_closed_crowdsale(4).expect("closed").close_reason,
        CloseReason::DeadlinePassed
    );
}

#[test]
fn late_contribution_closes_without_minting() {
    let mut engine = engine_with_open_sale();
    let height = GENESIS + 2;

    engine
        .apply_transaction(
            &tx(
                3,
                "oWhale",
                TxPayload::SimpleSend {
                    recipient: addr("oFounder"),
                    property: 3,
                    amount: 10,
                },
            ),
            height,
            START + 11 * SECONDS_PER_WEEK,
            0,
        )
        .expect("late send still transfers");

    // nothing minted, funds moved, sale closed by deadline
    assert_eq!(engine.get_balance(&addr("oWhale"), 4).available, 0);
    assert_eq!(engine.get_balance(&addr("oFounder"), 3).available, 10);
    assert_eq!(
        engine.get_closed_crowdsale(4).expect("closed").close_reason,
        CloseReason::DeadlinePassed
    );
    assert_eq!(engine.get_property(4).expect("exists").total_supply, 0);
}

#[test]
fn closed_sale_stops_minting_but_not_transfers() {
    let mut engine = engine_with_open_sale();
    let height = GENESIS + 2;

    engine
        .apply_transaction(
            &tx(3, "oFounder", TxPayload::CloseCrowdsale { property: 4 }),
            height,
            START + SECONDS_PER_WEEK,
            0,
        )
        .expect("close");
    assert_eq!(
        engine.get_closed_crowdsale(4).expect("closed").close_reason,
        CloseReason::CloseTransaction(txid(3))
    );

    // a later send to the former issuer is a plain transfer
    engine
        .apply_transaction(
            &tx(
                4,
                "oWhale",
                TxPayload::SimpleSend {
                    recipient: addr("oFounder"),
                    property: 3,
                    amount: 10,
                },
            ),
            height,
            START + 2 * SECONDS_PER_WEEK,
            1,
        )
        .expect("plain send");

    assert_eq!(engine.get_balance(&addr("oWhale"), 4).available, 0);
    assert_eq!(engine.get_balance(&addr("oFounder"), 3).available, 10);
    assert_eq!(engine.get_property(4).expect("exists").total_supply, 0);
}

#[test]
fn issuer_bonus_is_dropped_once_grant_effects_activates() {
    let mut engine = engine_with_open_sale();
    let height = GENESIS + 2;

    // activate the grant-effects cleanup with minimum notice
    let activation_height = height + 5;
    engine
        .apply_transaction(
            &admin_tx(
                3,
                "oAdmin",
                TxPayload::FeatureActivation {
                    feature_id: ob_01_consensus_rules::Feature::GrantEffects.id(),
                    activation_block: activation_height,
                    min_client_version: 0,
                },
            ),
            height,
            START + SECONDS_PER_WEEK,
            0,
        )
        .expect("activation");

    engine
        .apply_transaction(
            &tx(
                4,
                "oWhale",
                TxPayload::SimpleSend {
                    recipient: addr("oFounder"),
                    property: 3,
                    amount: 10,
                },
            ),
            activation_height,
            START + 2 * SECONDS_PER_WEEK,
            0,
        )
        .expect("post-activation contribution");

    // 10 * 100 * 1.04 = 1040 to the participant, nothing to the issuer
    assert_eq!(engine.get_balance(&addr("oWhale"), 4).available, 1_040);
    assert_eq!(engine.get_balance(&addr("oFounder"), 4).available, 0);
    assert_conserved(&engine, 4);
}
