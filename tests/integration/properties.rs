//! Order-independence, idempotence, and threshold monotonicity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use wolmar_audit::detect::circular::{CircularBuyerDetector, CircularConfig};
use wolmar_audit::detect::concentration::{ConcentrationConfig, ConcentrationDetector};
use wolmar_audit::detect::dominator::{DominatorConfig, DominatorDetector};
use wolmar_audit::detect::DetectionSuite;
use wolmar_audit::types::LotTable;

use crate::fixtures::{archive, sold};

fn circular(min_purchases: usize) -> CircularBuyerDetector {
    CircularBuyerDetector::new(CircularConfig {
        min_purchases,
        ..CircularConfig::default()
    })
    .unwrap()
}

fn dominators(min_wins: usize) -> DominatorDetector {
    DominatorDetector::new(DominatorConfig {
        min_wins,
        ..DominatorConfig::default()
    })
    .unwrap()
}

fn concentration(min_lots: usize) -> ConcentrationDetector {
    ConcentrationDetector::new(ConcentrationConfig { min_lots }).unwrap()
}

#[test]
fn lowering_thresholds_never_drops_findings() {
    let table = LotTable::new(archive()).unwrap();

    for t in 1..8 {
        let strict = circular(t + 1).detect(&table);
        let loose = circular(t).detect(&table);
        for f in &strict {
            assert!(loose.iter().any(|g| g.winner_login == f.winner_login
                && g.item_description == f.item_description));
        }

        let strict = dominators(t + 1).detect(&table);
        let loose = dominators(t).detect(&table);
        for p in &strict {
            assert!(loose.iter().any(|q| q.winner_login == p.winner_login));
        }

        let strict = concentration(t + 1).detect(&table);
        let loose = concentration(t).detect(&table);
        for e in &strict {
            assert!(loose.iter().any(|g| g.auction_number == e.auction_number
                && g.winner_login == e.winner_login));
        }
    }
}

#[test]
fn reruns_are_identical() {
    let table = LotTable::new(archive()).unwrap();
    let suite = DetectionSuite::with_defaults().unwrap();
    let first = suite.run_blocking(&table);
    let second = suite.run_blocking(&table);

    assert_eq!(
        serde_json::to_string(&first.circular).unwrap(),
        serde_json::to_string(&second.circular).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.dominators).unwrap(),
        serde_json::to_string(&second.dominators).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.concentration).unwrap(),
        serde_json::to_string(&second.concentration).unwrap()
    );
}

#[test]
fn row_order_does_not_change_results() {
    let rows = archive();
    let mut reversed = rows.clone();
    reversed.reverse();
    let mut rotated = rows.clone();
    rotated.rotate_left(rows.len() / 3);

    let suite = DetectionSuite::with_defaults().unwrap();
    let base = suite.run_blocking(&LotTable::new(rows).unwrap());
    for permuted in [reversed, rotated] {
        let other = suite.run_blocking(&LotTable::new(permuted).unwrap());
        assert_eq!(base.circular, other.circular);
        assert_eq!(base.dominators, other.dominators);
        assert_eq!(base.concentration, other.concentration);
    }
}

#[test]
fn price_dispersion_lowers_score() {
    let score = |prices: [Decimal; 3]| {
        let rows = prices
            .iter()
            .enumerate()
            .map(|(i, p)| sold("X", "1", "Coin-1", *p, 4, i as i64 * 7))
            .collect();
        circular(3).detect(&LotTable::new(rows).unwrap())[0].suspicion_score
    };

    let fixed = score([dec!(100), dec!(100), dec!(100)]);
    let dispersed = score([dec!(60), dec!(100), dec!(140)]);
    assert!(fixed > dispersed, "fixed {fixed} vs dispersed {dispersed}");
}

#[test]
fn purchase_count_boundary() {
    let rows: Vec<_> = (0..4)
        .map(|i| sold("X", "1", "Coin-1", dec!(10), 1, i))
        .collect();
    let table = LotTable::new(rows).unwrap();
    assert_eq!(circular(4).detect(&table).len(), 1);
    assert!(circular(5).detect(&table).is_empty());
}
