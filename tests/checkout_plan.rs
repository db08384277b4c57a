use chrono::NaiveDate;
use eco_market_api::error::CheckoutReason;
use eco_market_api::services::checkout_service::{CheckoutRow, StockDecrement, plan_purchase};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn line(title: &str, quantity: i32, stock: i32, expiration_date: NaiveDate) -> CheckoutRow {
    CheckoutRow {
        cart_id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        title: title.to_string(),
        quantity,
        stock,
        expiration_date,
    }
}

const TODAY: (i32, u32, u32) = (2025, 6, 1);

fn today() -> NaiveDate {
    date(TODAY.0, TODAY.1, TODAY.2)
}

#[test]
fn empty_cart_aborts() {
    let result = plan_purchase(&[], today());
    assert_eq!(result, Err(vec![CheckoutReason::EmptyCart]));
}

#[test]
fn expired_only_cart_aborts_as_empty() {
    let rows = [line("Old bread", 2, 50, date(2025, 5, 30))];
    let result = plan_purchase(&rows, today());
    assert_eq!(result, Err(vec![CheckoutReason::EmptyCart]));
}

#[test]
fn collects_every_shortfall_before_aborting() {
    let rows = [
        line("Peaches", 5, 3, date(2025, 6, 5)),
        line("Basil", 2, 10, date(2025, 6, 5)),
        line("Yogurt", 1, 0, date(2025, 6, 5)),
    ];

    let reasons = plan_purchase(&rows, today()).unwrap_err();
    assert_eq!(
        reasons,
        vec![
            CheckoutReason::StockShortfall {
                title: "Peaches".to_string(),
                available: 3,
            },
            CheckoutReason::StockShortfall {
                title: "Yogurt".to_string(),
                available: 0,
            },
        ]
    );
}

#[test]
fn any_shortfall_blocks_passing_lines_too() {
    let rows = [
        line("Peaches", 5, 3, date(2025, 6, 5)),
        line("Basil", 2, 10, date(2025, 6, 5)),
    ];

    // The basil line alone would succeed, but partial purchases are not
    // allowed.
    assert!(plan_purchase(&rows, today()).is_err());
}

#[test]
fn plan_decrements_exactly_the_eligible_quantities() {
    let peaches = line("Peaches", 3, 10, date(2025, 6, 5));
    let basil = line("Basil", 2, 2, date(2025, 6, 5));
    let stale = line("Old bread", 4, 50, date(2025, 5, 30));
    let rows = [peaches.clone(), basil.clone(), stale];

    let decrements = plan_purchase(&rows, today()).unwrap();
    assert_eq!(
        decrements,
        vec![
            StockDecrement {
                product_id: peaches.product_id,
                quantity: 3,
            },
            StockDecrement {
                product_id: basil.product_id,
                quantity: 2,
            },
        ]
    );
}

#[test]
fn quantity_equal_to_stock_passes() {
    let rows = [line("Basil", 2, 2, date(2025, 6, 5))];
    assert!(plan_purchase(&rows, today()).is_ok());
}

#[test]
fn product_expiring_today_is_eligible() {
    let rows = [line("Yogurt", 1, 5, today())];
    let decrements = plan_purchase(&rows, today()).unwrap();
    assert_eq!(decrements.len(), 1);
}
