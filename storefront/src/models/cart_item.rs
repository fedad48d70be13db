// storefront/src/models/cart_item.rs

use crate::models::product::{Product, ProductSummary};
use crate::pricing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of an account's server-side cart. At most one row exists per
/// `(user_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// A cart row joined with its live product and priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
  pub id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
  pub product: ProductSummary,
  /// Discounted unit price in currency units.
  pub unit_price: f64,
  pub line_total: f64,
}

/// Body of `GET /cart`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
  pub items: Vec<CartItemView>,
  pub total: f64,
  /// Sum of quantities, not the number of rows.
  pub item_count: i64,
}

impl CartView {
  pub fn from_rows(rows: Vec<(CartItem, Product)>) -> Self {
    let item_count = rows.iter().map(|(item, _)| i64::from(item.quantity)).sum();
    let total = pricing::cart_total(
      rows
        .iter()
        .map(|(item, product)| (product.price_cents, product.discount_percent, item.quantity)),
    );
    let items = rows
      .into_iter()
      .map(|(item, product)| {
        let unit_cents = pricing::unit_price_cents(product.price_cents, product.discount_percent);
        CartItemView {
          id: item.id,
          product_id: item.product_id,
          quantity: item.quantity,
          added_at: item.added_at,
          product: ProductSummary::from(&product),
          unit_price: pricing::round2(pricing::cents_to_units(unit_cents)),
          line_total: pricing::round2(pricing::cents_to_units(unit_cents * f64::from(item.quantity))),
        }
      })
      .collect();
    Self {
      items,
      total,
      item_count,
    }
  }
}
