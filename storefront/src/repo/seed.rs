// storefront/src/repo/seed.rs

//! Demo catalogue loaded when `SEED_DB=true`, and by tests.

use crate::models::Product;
use chrono::Utc;
use uuid::Uuid;

fn product(
  id: u128,
  name: &str,
  description: &str,
  price_cents: i64,
  discount_percent: i32,
  stock_quantity: i32,
  category: &str,
) -> Product {
  let now = Utc::now();
  Product {
    id: Uuid::from_u128(id),
    name: name.to_string(),
    description: Some(description.to_string()),
    price_cents,
    discount_percent,
    stock_quantity,
    image_url: Some(format!("/images/products/{:x}.jpg", id)),
    category: Some(category.to_string()),
    created_at: now,
    updated_at: now,
  }
}

/// Fixed ids keep re-seeding idempotent.
pub fn demo_products() -> Vec<Product> {
  vec![
    product(0x5eed_0001, "Trail Running Shoes", "Lightweight shoes with a grippy outsole.", 15000, 20, 25, "footwear"),
    product(0x5eed_0002, "Merino Wool Socks", "Three pairs, cushioned heel.", 2400, 0, 120, "apparel"),
    product(0x5eed_0003, "Insulated Water Bottle", "750 ml, keeps drinks cold for 24 hours.", 3299, 10, 60, "accessories"),
    product(0x5eed_0004, "Packable Rain Jacket", "Waterproof shell that folds into its own pocket.", 8900, 0, 15, "apparel"),
    product(0x5eed_0005, "Headlamp", "USB rechargeable, 400 lumens.", 4599, 15, 0, "accessories"),
  ]
}
