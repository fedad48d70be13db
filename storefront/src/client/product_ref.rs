// storefront/src/client/product_ref.rs

//! The one product shape the client works with.
//!
//! API payloads carry products in several layouts: nested under `products`
//! (join results), nested under `product`, or flat. `ProductRef::from_json`
//! folds all of them into `ProductRef` at the boundary.

use crate::client::errors::{ClientError, ClientResult};
use crate::models::{Product, ProductSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Cached product snapshot stored with a guest cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub category: Option<String>,
}

fn str_field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
  keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

fn price_cents(obj: &Value) -> Option<i64> {
  if let Some(cents) = ["priceCents", "price_cents"].iter().find_map(|k| obj.get(*k).and_then(Value::as_i64)) {
    return Some(cents);
  }
  // `price` is in currency units.
  obj.get("price").and_then(|p| match p {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  })
  .map(|units| (units * 100.0).round() as i64)
}

impl ProductRef {
  pub fn from_json(value: &Value) -> ClientResult<Self> {
    let obj = ["products", "product"]
      .iter()
      .find_map(|k| value.get(*k).filter(|v| v.is_object()))
      .unwrap_or(value);

    let id = str_field(obj, &["id", "productId", "product_id"])
      .or_else(|| str_field(value, &["productId", "product_id"]))
      .ok_or_else(|| ClientError::Validation("Product identifier is missing.".to_string()))?;
    let id = Uuid::parse_str(id).map_err(|e| ClientError::Validation(format!("Invalid product identifier: {}", e)))?;

    Ok(Self {
      id,
      name: str_field(obj, &["name"]).unwrap_or_default().to_string(),
      price_cents: price_cents(obj).unwrap_or(0),
      image_url: str_field(obj, &["imageUrl", "image_url"]).map(str::to_string),
      category: str_field(obj, &["category"]).map(str::to_string),
    })
  }
}

impl From<&Product> for ProductRef {
  fn from(p: &Product) -> Self {
    Self {
      id: p.id,
      name: p.name.clone(),
      price_cents: p.price_cents,
      image_url: p.image_url.clone(),
      category: p.category.clone(),
    }
  }
}

impl From<&ProductSummary> for ProductRef {
  fn from(p: &ProductSummary) -> Self {
    Self {
      id: p.id,
      name: p.name.clone(),
      price_cents: p.price_cents,
      image_url: p.image_url.clone(),
      category: p.category.clone(),
    }
  }
}
