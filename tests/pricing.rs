use chrono::NaiveDate;
use eco_market_api::services::pricing::{PricedRow, compute_totals, format_money};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn row(cart_id: Uuid, quantity: i32, discounted_price: i64, expiration_date: NaiveDate) -> PricedRow {
    PricedRow {
        cart_id,
        quantity,
        discounted_price,
        expiration_date,
    }
}

#[test]
fn money_renders_two_decimals() {
    assert_eq!(format_money(0), "0.00");
    assert_eq!(format_money(5), "0.05");
    assert_eq!(format_money(4500), "45.00");
    assert_eq!(format_money(123456), "1234.56");
}

#[test]
fn single_line_subtotal() {
    let today = date(2025, 6, 1);
    let id = Uuid::new_v4();
    // qty 3 at 15.00 discounted
    let totals = compute_totals(&[row(id, 3, 1500, date(2025, 6, 10))], today);

    assert_eq!(totals.subtotal, "45.00");
    assert_eq!(totals.total, "45.00");
    let line = &totals.per_line[&id];
    assert!(!line.expired);
    assert_eq!(line.subtotal, "45.00");
}

#[test]
fn incremented_line_reprices() {
    let today = date(2025, 6, 1);
    let id = Uuid::new_v4();
    // the same line after another add of qty 2
    let totals = compute_totals(&[row(id, 5, 1500, date(2025, 6, 10))], today);

    assert_eq!(totals.subtotal, "75.00");
    assert_eq!(totals.total, "75.00");
}

#[test]
fn expired_line_prices_zero_but_stays_listed() {
    let today = date(2025, 6, 1);
    let fresh = Uuid::new_v4();
    let expired = Uuid::new_v4();
    let rows = [
        row(fresh, 2, 1000, date(2025, 6, 2)),
        // quantity and price are irrelevant once expired
        row(expired, 4, 9999, date(2025, 5, 31)),
    ];

    let totals = compute_totals(&rows, today);

    assert_eq!(totals.subtotal, "20.00");
    assert_eq!(totals.total, "20.00");
    assert_eq!(totals.per_line.len(), 2);
    assert!(totals.per_line[&expired].expired);
    assert_eq!(totals.per_line[&expired].subtotal, "0.00");
    assert!(!totals.per_line[&fresh].expired);
}

#[test]
fn expiring_today_still_counts() {
    let today = date(2025, 6, 1);
    let id = Uuid::new_v4();
    let totals = compute_totals(&[row(id, 1, 700, today)], today);

    assert_eq!(totals.subtotal, "7.00");
    assert!(!totals.per_line[&id].expired);
}

#[test]
fn empty_cart_totals_zero() {
    let totals = compute_totals(&[], date(2025, 6, 1));
    assert_eq!(totals.subtotal, "0.00");
    assert_eq!(totals.total, "0.00");
    assert!(totals.per_line.is_empty());
}

#[test]
fn recomputation_is_idempotent() {
    let today = date(2025, 6, 1);
    let rows = [
        row(Uuid::new_v4(), 3, 1500, date(2025, 6, 10)),
        row(Uuid::new_v4(), 1, 250, date(2025, 5, 20)),
    ];

    let first = compute_totals(&rows, today);
    let second = compute_totals(&rows, today);
    assert_eq!(first, second);
}
