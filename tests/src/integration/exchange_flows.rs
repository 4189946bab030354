//! DEx and MetaDEx flows driven through the full engine.

use crate::integration::support::*;
use node_runtime::StateEngine;
use ob_01_consensus_rules::Feature;
use shared_types::{DexAction, Ecosystem, TxOutcome, TxPayload, PROPERTY_OBL};

#[test]
fn dex_offer_accept_pay_and_expiry() {
    let mut engine = StateEngine::regtest();
    let height = GENESIS + 1;

    let txs = vec![
        tx(
            1,
            "oSeller",
            TxPayload::CreatePropertyFixed {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Widget"),
                amount: 1_000,
            },
        ),
        tx(
            2,
            "oSeller",
            TxPayload::DexSellOffer {
                property: 3,
                amount_for_sale: 600,
                anchor_desired: 300,
                payment_window: 5,
                min_accept_fee: 0,
                action: DexAction::New,
            },
        ),
        tx(
            3,
            "oBuyer",
            TxPayload::DexAccept {
                seller: addr("oSeller"),
                property: 3,
                amount: 200,
            },
        ),
    ];
    let (outcomes, _) = engine
        .apply_block(&txs, height, &block_hash(height), 1_000)
        .expect("block connects");
    assert!(outcomes.iter().all(|o| o.is_ok()));

    // 600 reserved by the offer, 200 of it earmarked for the buyer
    assert_eq!(engine.get_balance(&addr("oSeller"), 3).reserved, 600);
    let offers = engine.get_active_dex_offers(None);
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].amount_remaining, 400);
    assert_eq!(offers[0].anchor_still_desired(), 200);

    // buyer pays half of what settles the earmark: 200 tokens cost 100
    let settlements = engine
        .apply_dex_payment(&addr("oBuyer"), &addr("oSeller"), 50)
        .expect("payment");
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].amount_purchased, 100);
    assert_eq!(engine.get_balance(&addr("oBuyer"), 3).available, 100);

    // the unpaid rest of the earmark expires with the window
    let summary = engine
        .end_block(height + 5, &block_hash(height + 5), 2_000)
        .expect("expiry block");
    assert_eq!(summary.expired_accepts, 1);

    let seller = engine.get_balance(&addr("oSeller"), 3);
    // 400 still reserved by the open offer; the expired 100 came back
    assert_eq!(seller.reserved, 400);
    assert_eq!(seller.available, 500);
    assert!(engine.get_dex_accepts(&addr("oSeller"), 3).is_empty());
    assert_conserved(&engine, 3);
}

#[test]
fn metadex_priority_and_partial_fills_through_the_engine() {
    let mut engine = StateEngine::regtest();
    let height = GENESIS + 1;

    // two holders of Widget quote the same price in one block; a third
    // address crosses both in the next block
    let setup = vec![
        tx(
            1,
            "oAlice",
            TxPayload::CreatePropertyFixed {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Widget"),
                amount: 10_000,
            },
        ),
        tx(
            2,
            "oAlice",
            TxPayload::SimpleSend {
                recipient: addr("oBob"),
                property: 3,
                amount: 5_000,
            },
        ),
        tx(
            3,
            "oAlice",
            TxPayload::MetaDexTrade {
                property_for_sale: 3,
                amount_for_sale: 30,
                property_desired: PROPERTY_OBL,
                amount_desired: 30,
            },
        ),
        tx(
            4,
            "oBob",
            TxPayload::MetaDexTrade {
                property_for_sale: 3,
                amount_for_sale: 100,
                property_desired: PROPERTY_OBL,
                amount_desired: 100,
            },
        ),
    ];
    let (outcomes, _) = engine
        .apply_block(&setup, height, &block_hash(height), 1_000)
        .expect("setup block");
    assert!(outcomes.iter().all(|o| o.is_ok()));

    // the treasury grants itself native tokens and crosses the book
    let treasury = engine.config().genesis_issuer.clone();
    let cross = vec![
        tx(
            5,
            treasury.as_str(),
            TxPayload::GrantTokens {
                recipient: treasury.clone(),
                property: PROPERTY_OBL,
                amount: 1_000,
            },
        ),
        tx(
            6,
            treasury.as_str(),
            TxPayload::MetaDexTrade {
                property_for_sale: PROPERTY_OBL,
                amount_for_sale: 100,
                property_desired: 3,
                amount_desired: 100,
            },
        ),
    ];
    let (outcomes, _) = engine
        .apply_block(&cross, height + 1, &block_hash(height + 1), 1_100)
        .expect("crossing block");
    assert!(outcomes[0].is_ok());

    // Alice's earlier order fills fully, Bob's partially (30 + 70)
    assert_eq!(
        outcomes[1],
        Ok(TxOutcome::Traded {
            fills: 2,
            rested: false,
        })
    );
    assert_eq!(engine.get_balance(&addr("oAlice"), PROPERTY_OBL).available, 30);
    assert_eq!(engine.get_balance(&addr("oBob"), PROPERTY_OBL).available, 70);
    assert_eq!(engine.get_balance(&treasury, 3).available, 100);

    let book = engine.get_order_book(3, Some(PROPERTY_OBL));
    assert_eq!(book.len(), 1);
    assert_eq!(book[0].address, addr("oBob"));
    assert_eq!(book[0].amount_remaining, 30);

    assert_conserved(&engine, 3);
    assert_conserved(&engine, PROPERTY_OBL);
}

#[test]
fn metadex_cancel_by_pair_releases_only_that_scope() {
    let mut engine = StateEngine::regtest();
    let height = GENESIS + 1;

    let txs = vec![
        tx(
            1,
            "oAlice",
            TxPayload::CreatePropertyFixed {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Widget"),
                amount: 1_000,
            },
        ),
        tx(
            2,
            "oAlice",
            TxPayload::CreatePropertyFixed {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Gadget"),
                amount: 1_000,
            },
        ),
        tx(
            3,
            "oAlice",
            TxPayload::MetaDexTrade {
                property_for_sale: 3,
                amount_for_sale: 100,
                property_desired: PROPERTY_OBL,
                amount_desired: 50,
            },
        ),
        tx(
            4,
            "oAlice",
            TxPayload::MetaDexTrade {
                property_for_sale: 4,
                amount_for_sale: 200,
                property_desired: PROPERTY_OBL,
                amount_desired: 50,
            },
        ),
        tx(
            5,
            "oAlice",
            TxPayload::MetaDexCancelPair {
                property_for_sale: 3,
                property_desired: PROPERTY_OBL,
            },
        ),
    ];
    let (outcomes, _) = engine
        .apply_block(&txs, height, &block_hash(height), 1_000)
        .expect("block connects");
    assert!(outcomes.iter().all(|o| o.is_ok()));

    // the (3, OBL) order is gone and its reservation released; (4, OBL)
    // still rests
    assert!(engine.get_order_book(3, Some(PROPERTY_OBL)).is_empty());
    assert_eq!(engine.get_order_book(4, Some(PROPERTY_OBL)).len(), 1);
    assert_eq!(engine.get_balance(&addr("oAlice"), 3).available, 1_000);
    assert_eq!(engine.get_balance(&addr("oAlice"), 3).reserved, 0);
    assert_eq!(engine.get_balance(&addr("oAlice"), 4).reserved, 200);
}

#[test]
fn trade_fee_is_collected_and_distributed_to_native_holders() {
    let mut engine = StateEngine::regtest();
    let treasury = engine.config().genesis_issuer.clone();
    let height = GENESIS + 1;

    // activate the fee system and all-pair trading with the regtest
    // minimum notice
    let activation_height = height + 7;
    let activations = vec![
        admin_tx(
            1,
            "oAdmin",
            TxPayload::FeatureActivation {
                feature_id: Feature::Fees.id(),
                activation_block: activation_height,
                min_client_version: 0,
            },
        ),
        admin_tx(
            2,
            "oAdmin",
            TxPayload::FeatureActivation {
                feature_id: Feature::TradeAllPairs.id(),
                activation_block: activation_height,
                min_client_version: 0,
            },
        ),
        tx(
            3,
            treasury.as_str(),
            TxPayload::GrantTokens {
                recipient: addr("oSmall"),
                property: PROPERTY_OBL,
                amount: 100,
            },
        ),
        tx(
            4,
            treasury.as_str(),
            TxPayload::GrantTokens {
                recipient: addr("oLarge"),
                property: PROPERTY_OBL,
                amount: 300,
            },
        ),
        tx(
            5,
            "oMaker",
            TxPayload::CreatePropertyFixed {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Base"),
                amount: 100_000,
            },
        ),
        tx(
            6,
            "oTaker",
            TxPayload::CreatePropertyFixed {
                ecosystem: Ecosystem::Main,
                divisible: false,
                info: named("Quote"),
                amount: 100_000,
            },
        ),
    ];
    let (outcomes, _) = engine
        .apply_block(&activations, height, &block_hash(height), 1_000)
        .expect("setup block");
    assert!(outcomes.iter().all(|o| o.is_ok()));

    // after activation: a non-native pair trade charges the taker 0.05%
    let trades = vec![
        tx(
            7,
            "oMaker",
            TxPayload::MetaDexTrade {
                property_for_sale: 3,
                amount_for_sale: 10_000,
                property_desired: 4,
                amount_desired: 10_000,
            },
        ),
        tx(
            8,
            "oTaker",
            TxPayload::MetaDexTrade {
                property_for_sale: 4,
                amount_for_sale: 10_000,
                property_desired: 3,
                amount_desired: 10_000,
            },
        ),
    ];
    let (outcomes, _) = engine
        .apply_block(
            &trades,
            activation_height,
            &block_hash(activation_height),
            2_000,
        )
        .expect("trading block");
    assert!(outcomes.iter().all(|o| o.is_ok()));

    // fee on the taker's received property: 10,000 / 2,000 = 5 units of
    // property 3; threshold is 100,000 / 100,000 = 1, so it distributes
    // immediately to the native-token holders 1:3
    assert_eq!(engine.get_balance(&addr("oTaker"), 3).available, 9_995);
    assert_eq!(engine.get_balance(&addr("oSmall"), 3).available, 1);
    assert_eq!(engine.get_balance(&addr("oLarge"), 3).available, 3);
    assert_eq!(engine.get_fee_cache(3), 1);

    let distributions = engine.get_fee_distributions(3);
    assert_eq!(distributions.len(), 1);
    assert_eq!(distributions[0].total, 5);
    assert_eq!(distributions[0].distributed(), 4);

    // maker side pays no fee
    assert_eq!(engine.get_balance(&addr("oMaker"), 4).available, 10_000);
    assert_conserved(&engine, 3);
    assert_conserved(&engine, 4);
}
