//! Demo catalog, stock, coupons and users.

use chrono::{DateTime, Duration, Utc};
use common::{ProductId, WarehouseId};
use domain::{
    Coupon, CouponDiscount, CouponStore, DomainError, InventoryStore, Money, Product,
    ProductCatalog, Stock, User, Warehouse, WarehouseDirectory,
};
use fulfillment::PaymentGateway;

use crate::state::AppState;

pub const ADMIN_USER: &str = "admin";
pub const DEMO_USER: &str = "customer";

const WAREHOUSES: [(&str, &str, &str); 3] = [
    ("WH-001", "Central Warehouse", "Chicago"),
    ("WH-002", "East Coast Hub", "Newark"),
    ("WH-003", "West Coast Hub", "Reno"),
];

/// (id, name, category, price, stock in WH-001/002/003)
const PRODUCTS: [(&str, &str, &str, i64, [u32; 3]); 6] = [
    ("PRD-001", "Mechanical Keyboard", "Electronics", 12000, [20, 10, 5]),
    ("PRD-002", "Wireless Mouse", "Electronics", 4500, [50, 30, 0]),
    ("PRD-003", "USB-C Cable", "Accessories", 1500, [100, 100, 100]),
    ("PRD-004", "Laptop Stand", "Accessories", 3800, [0, 15, 10]),
    ("PRD-005", "Desk Lamp", "Home", 2900, [8, 0, 0]),
    ("PRD-006", "Notebook", "Stationery", 600, [200, 50, 0]),
];

/// Loads the demo data set into empty stores.
#[tracing::instrument(skip(state))]
pub async fn seed_demo_data<P: PaymentGateway>(state: &AppState<P>) -> Result<(), DomainError> {
    let now = Utc::now();

    for (id, name, location) in WAREHOUSES {
        state
            .warehouses
            .create(Warehouse::new(id, name, location, now)?)
            .await?;
    }

    for (id, name, category, price, quantities) in PRODUCTS {
        state
            .catalog
            .create(Product::new(
                id,
                name,
                format!("{name} ({category})"),
                Money::from_minor(price),
                category,
                now,
            )?)
            .await?;

        for ((warehouse, _, _), quantity) in WAREHOUSES.iter().zip(quantities) {
            if quantity > 0 {
                state
                    .inventory
                    .create(Stock::new(
                        ProductId::new(id),
                        WarehouseId::new(*warehouse),
                        quantity,
                        now,
                    ))
                    .await?;
            }
        }
    }

    for coupon in demo_coupons(now)? {
        state.coupons.create(coupon).await?;
    }

    state.identity.register(User::admin(ADMIN_USER, "Administrator")).await;
    state.identity.register(User::new(DEMO_USER, "Demo Customer")).await;

    tracing::info!(
        warehouses = WAREHOUSES.len(),
        products = PRODUCTS.len(),
        "Demo data loaded"
    );
    Ok(())
}

fn demo_coupons(now: DateTime<Utc>) -> Result<Vec<Coupon>, DomainError> {
    Ok(vec![
        Coupon::new(
            "WELCOME10",
            "10% off your order",
            CouponDiscount::Percentage(10),
            now,
        )?,
        Coupon::new(
            "SAVE500",
            "500 off orders over 3000",
            CouponDiscount::Fixed(Money::from_minor(500)),
            now,
        )?
        .with_minimum_order(Money::from_minor(3000)),
        Coupon::new(
            "VIP20",
            "20% off orders over 10000, first 100 customers",
            CouponDiscount::Percentage(20),
            now,
        )?
        .with_minimum_order(Money::from_minor(10000))
        .with_usage_limit(100),
        Coupon::new(
            "SUMMER",
            "Last season's promotion",
            CouponDiscount::Percentage(15),
            now,
        )?
        .with_validity(now - Duration::days(120), now - Duration::days(30))?,
    ])
}
