//! Lot builders shared by the integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use wolmar_audit::types::LotRecord;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 18, 0, 0).unwrap()
}

/// A sold lot ending `day` days after the fixture epoch.
pub fn sold(
    winner: &str,
    auction: &str,
    item: &str,
    bid: Decimal,
    bids_count: u32,
    day: i64,
) -> LotRecord {
    LotRecord {
        lot_number: format!("{auction}-{day}-{item}"),
        auction_number: auction.to_string(),
        item_description: item.to_string(),
        winner_login: Some(winner.to_string()),
        winning_bid: bid,
        bids_count,
        auction_end_date: epoch() + Duration::days(day),
        category: Some("coins".to_string()),
    }
}

pub fn unsold(auction: &str, item: &str, day: i64) -> LotRecord {
    LotRecord {
        winner_login: None,
        bids_count: 0,
        ..sold("nobody", auction, item, Decimal::ZERO, 0, day)
    }
}

/// A mixed archive: a fixed-price reseller, a sweeper, a heavy buyer
/// spread over several auctions, and background noise.
pub fn archive() -> Vec<LotRecord> {
    let mut rows = Vec::new();

    // Reseller: same coin every week at the same price, little competition.
    for week in 0..5 {
        rows.push(sold(
            "reseller",
            &format!("{}", 900 + week),
            "Rouble 1898 AG",
            Decimal::from(1200),
            2,
            week * 7,
        ));
    }

    // Sweeper: 8 lots in auction 903.
    for i in 0..8 {
        rows.push(sold(
            "sweeper",
            "903",
            &format!("Kopek lot {i}"),
            Decimal::from(50 + i),
            6,
            21,
        ));
    }

    // Collector: 12 wins spread over 2 auctions, all different items.
    for i in 0..12 {
        let auction = if i % 2 == 0 { "901" } else { "902" };
        rows.push(sold(
            "collector",
            auction,
            &format!("Medal {i}"),
            Decimal::from(300 + 10 * i),
            9,
            7 + (i % 2) * 7,
        ));
    }

    // Competitive repeat buyer: same item, scattered prices, many bids.
    for (k, price) in [400, 900, 650].into_iter().enumerate() {
        rows.push(sold(
            "enthusiast",
            &format!("{}", 900 + k as i64),
            "Thaler 1750",
            Decimal::from(price),
            15,
            k as i64 * 7,
        ));
    }

    for day in 0..4 {
        rows.push(unsold("904", "Unsold coin", day + 28));
    }

    rows
}
