//! Worked scenarios from the detector contracts.

use rust_decimal_macros::dec;
use std::sync::Arc;

use wolmar_audit::detect::scoring::{DominanceTiers, SuspicionWeights};
use wolmar_audit::detect::{DetectionSuite, Thresholds};
use wolmar_audit::report;
use wolmar_audit::source::{LotSource, MemorySource};
use wolmar_audit::types::{AuditError, DominanceLevel, LotTable};

use crate::fixtures::{archive, sold, unsold};

#[tokio::test]
async fn fixed_price_repeat_purchase_scores_85() {
    let rows = vec![
        sold("X", "1", "Coin-1", dec!(100), 4, 0),
        sold("X", "2", "Coin-1", dec!(100), 4, 7),
        sold("X", "3", "Coin-1", dec!(100), 4, 14),
    ];
    let table = MemorySource::new(rows).load().await.unwrap();
    let outcome = DetectionSuite::with_defaults()
        .unwrap()
        .run(Arc::new(table))
        .await
        .unwrap();

    assert_eq!(outcome.circular.len(), 1);
    let f = &outcome.circular[0];
    assert_eq!(f.winner_login, "X");
    assert_eq!(f.purchase_count, 3);
    assert_eq!(f.price_cv, 0.0);
    assert!((f.suspicion_score - 85.0).abs() < 1e-9);
}

#[tokio::test]
async fn twelve_wins_over_two_auctions_is_high() {
    let rows = (0..12)
        .map(|i| sold("Y", if i < 6 { "10" } else { "11" }, &format!("Item {i}"), dec!(5), 3, i))
        .collect();
    let table = MemorySource::new(rows).load().await.unwrap();
    let outcome = DetectionSuite::with_defaults()
        .unwrap()
        .run(Arc::new(table))
        .await
        .unwrap();

    assert_eq!(outcome.dominators.len(), 1);
    let p = &outcome.dominators[0];
    assert_eq!(p.total_wins, 12);
    assert!((p.wins_per_auction - 6.0).abs() < 1e-9);
    assert_eq!(p.level, DominanceLevel::High);
}

#[tokio::test]
async fn six_lots_in_one_auction_is_one_event() {
    let rows = (0..6)
        .map(|i| sold("Z", "100", &format!("Item {i}"), dec!(20), 3, 0))
        .collect();
    let table = MemorySource::new(rows).load().await.unwrap();
    let outcome = DetectionSuite::with_defaults()
        .unwrap()
        .run(Arc::new(table))
        .await
        .unwrap();

    assert_eq!(outcome.concentration.len(), 1);
    let e = &outcome.concentration[0];
    assert_eq!((e.auction_number.as_str(), e.winner_login.as_str()), ("100", "Z"));
    assert_eq!(e.lots_won, 6);
    assert_eq!(e.total_spent, dec!(120));
}

#[tokio::test]
async fn table_without_winners_yields_empty_results() {
    let rows = (0..20).map(|i| unsold("300", "Coin-1", i)).collect();
    let table = MemorySource::new(rows).load().await.unwrap();
    let outcome = DetectionSuite::new(
        Thresholds {
            min_purchases: 1,
            min_wins: 1,
            min_lots: 1,
        },
        SuspicionWeights::default(),
        DominanceTiers::default(),
    )
    .unwrap()
    .run(Arc::new(table))
    .await
    .unwrap();

    assert!(outcome.circular.is_empty());
    assert!(outcome.dominators.is_empty());
    assert!(outcome.concentration.is_empty());
    assert_eq!(outcome.summary.sold_lots, 0);
    assert_eq!(outcome.summary.total_lots, 20);
}

#[tokio::test]
async fn empty_table_is_not_an_error() {
    let outcome = DetectionSuite::with_defaults()
        .unwrap()
        .run(Arc::new(LotTable::default()))
        .await
        .unwrap();
    assert!(outcome.circular.is_empty());
    assert!(outcome.summary.first_end_date.is_none());
}

#[tokio::test]
async fn mixed_archive() {
    let table = MemorySource::new(archive()).load().await.unwrap();
    let outcome = DetectionSuite::with_defaults()
        .unwrap()
        .run(Arc::new(table))
        .await
        .unwrap();

    let circular: Vec<&str> = outcome.circular.iter().map(|f| f.winner_login.as_str()).collect();
    assert_eq!(circular, vec!["reseller", "enthusiast"]);
    // 5 * 15 + (5 / 4) * 10 + (5 - 2) * 5 + 20
    assert!((outcome.circular[0].suspicion_score - 122.5).abs() < 1e-9);
    assert!((outcome.circular[1].suspicion_score - 60.0).abs() < 1e-9);

    assert_eq!(outcome.dominators.len(), 1);
    assert_eq!(outcome.dominators[0].winner_login, "collector");
    assert_eq!(outcome.dominators[0].level, DominanceLevel::High);

    let sweeps: Vec<(&str, &str, usize)> = outcome
        .concentration
        .iter()
        .map(|e| (e.auction_number.as_str(), e.winner_login.as_str(), e.lots_won))
        .collect();
    assert_eq!(
        sweeps,
        vec![("903", "sweeper", 8), ("901", "collector", 6), ("902", "collector", 6)]
    );

    let text = report::render(&outcome, 10);
    assert!(text.contains("Rouble 1898 AG"));
    assert!(text.contains("Found: 2 suspicious patterns"));
    assert!(text.contains("No critical dominators."));
}

#[test]
fn misconfigured_suite_is_rejected() {
    for thresholds in [
        Thresholds { min_purchases: 0, ..Thresholds::default() },
        Thresholds { min_wins: 0, ..Thresholds::default() },
        Thresholds { min_lots: 0, ..Thresholds::default() },
    ] {
        let result = DetectionSuite::new(
            thresholds,
            SuspicionWeights::default(),
            DominanceTiers::default(),
        );
        assert!(matches!(result, Err(AuditError::Config(_))));
    }
}

#[test]
fn malformed_row_fails_whole_load() {
    let json = r#"[
        {"lot_number": 1, "auction_number": 1, "item_description": "a", "winner_login": "X",
         "winning_bid": 10, "bids_count": 1, "auction_end_date": "2025-01-01", "category": "c"},
        {"lot_number": 2, "auction_number": 1, "item_description": "a", "winner_login": "X",
         "winning_bid": 10, "bids_count": "many", "auction_end_date": "2025-01-01", "category": "c"}
    ]"#;
    assert!(matches!(
        LotTable::from_json_str(json),
        Err(AuditError::MalformedInput { row: 1, .. })
    ));
}
