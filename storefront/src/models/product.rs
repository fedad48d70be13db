// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  /// Whole percent off the list price; 0 means no discount.
  pub discount_percent: i32,
  pub stock_quantity: i32,
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The product fields a cart line carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
  #[serde(default)]
  pub discount_percent: i32,
  #[serde(default)]
  pub stock_quantity: i32,
  pub image_url: Option<String>,
  pub category: Option<String>,
}

impl From<&Product> for ProductSummary {
  fn from(p: &Product) -> Self {
    Self {
      id: p.id,
      name: p.name.clone(),
      price_cents: p.price_cents,
      discount_percent: p.discount_percent,
      stock_quantity: p.stock_quantity,
      image_url: p.image_url.clone(),
      category: p.category.clone(),
    }
  }
}
