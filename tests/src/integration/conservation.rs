//! Supply conservation across mixed blocks.

use crate::integration::support::*;
use node_runtime::StateEngine;
use shared_types::{DexAction, Ecosystem, TxPayload, PROPERTY_OBL};

#[test]
fn conservation_holds_across_a_mixed_block() {
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
                amount: 100_000,
            },
        ),
        tx(
            2,
            "oAlice",
            TxPayload::SimpleSend {
                recipient: addr("oBob"),
                property: 3,
                amount: 40_000,
            },
        ),
        tx(
            3,
            "oAlice",
            TxPayload::DexSellOffer {
                property: 3,
                amount_for_sale: 10_000,
                anchor_desired: 500,
                payment_window: 10,
                min_accept_fee: 0,
                action: DexAction::New,
            },
        ),
        tx(
            4,
            "oBob",
            TxPayload::MetaDexTrade {
                property_for_sale: 3,
                amount_for_sale: 5_000,
                property_desired: PROPERTY_OBL,
                amount_desired: 100,
            },
        ),
        tx(
            5,
            "oBob",
            TxPayload::SendToOwners {
                property: 3,
                amount: 1_000,
                distribution_property: 3,
            },
        ),
        // invalid: overspends, must be rejected with no effect
        tx(
            6,
            "oBob",
            TxPayload::SimpleSend {
                recipient: addr("oCarol"),
                property: 3,
                amount: 1_000_000,
            },
        ),
    ];

    let (outcomes, _) = engine
        .apply_block(&txs, height, &block_hash(height), 1_000)
        .expect("block connects");

    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(outcomes[2].is_ok());
    assert!(outcomes[3].is_ok());
    assert!(outcomes[4].is_ok());
    assert!(outcomes[5].is_err());

    assert_conserved(&engine, 3);
    assert_eq!(
        engine.get_property(3).expect("exists").total_supply,
        100_000
    );

    // no bucket anywhere went negative
    for (_, tally) in engine.get_property_holders(3) {
        assert!(tally.available >= 0);
        assert!(tally.reserved >= 0);
        assert!(tally.frozen >= 0);
    }
}

#[test]
fn conservation_survives_grant_revoke_and_freeze() {
    let mut engine = StateEngine::regtest();
    let height = GENESIS + 1;

    let txs = vec![
        tx(
            1,
            "oIssuer",
            TxPayload::CreatePropertyManaged {
                ecosystem: Ecosystem::Main,
                divisible: true,
                info: named("Bond"),
            },
        ),
        tx(
            2,
            "oIssuer",
            TxPayload::GrantTokens {
                recipient: addr("oBob"),
                property: 3,
                amount: 9_000,
            },
        ),
        tx(
            3,
            "oIssuer",
            TxPayload::GrantTokens {
                recipient: addr("oIssuer"),
                property: 3,
                amount: 1_000,
            },
        ),
        tx(
            4,
            "oIssuer",
            TxPayload::RevokeTokens {
                property: 3,
                amount: 250,
            },
        ),
        tx(5, "oIssuer", TxPayload::EnableFreezing { property: 3 }),
        tx(
            6,
            "oIssuer",
            TxPayload::FreezeTokens {
                target: addr("oBob"),
                property: 3,
            },
        ),
    ];

    let (outcomes, _) = engine
        .apply_block(&txs, height, &block_hash(height), 1_000)
        .expect("block connects");
    assert!(outcomes.iter().all(|o| o.is_ok()));

    assert_eq!(engine.get_property(3).expect("exists").total_supply, 9_750);
    assert_conserved(&engine, 3);

    let bob = engine.get_balance(&addr("oBob"), 3);
    assert_eq!(bob.available, 0);
    assert_eq!(bob.frozen, 9_000);
}

#[test]
fn replaying_identical_blocks_reproduces_the_consensus_hash() {
    let build = || {
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
                    amount: 5_000,
                },
            ),
            tx(
                2,
                "oAlice",
                TxPayload::SimpleSend {
                    recipient: addr("oBob"),
                    property: 3,
                    amount: 1_234,
                },
            ),
        ];
        engine
            .apply_block(&txs, height, &block_hash(height), 1_000)
            .expect("block connects");
        engine
    };

    let first = build();
    let second = build();
    assert_eq!(first.consensus_hash(), second.consensus_hash());

    // a reorg reset followed by replay converges on the same hash
    let mut reorged = build();
    let replay_from = reorged.rollback_to(GENESIS);
    assert_eq!(replay_from, GENESIS);
    let rebuilt = build();
    assert_eq!(rebuilt.consensus_hash(), first.consensus_hash());
}
