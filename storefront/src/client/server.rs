// storefront/src/client/server.rs

//! The account cart as seen from the client.

use crate::client::errors::ClientResult;
use crate::client::http::{ApiConnection, AuthMode};
use crate::models::{CartItem, CartView};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Every operation needs a session; without one it fails with `ClientError::Unauthorized`.
#[async_trait]
pub trait ServerCart: Send + Sync {
  async fn fetch(&self) -> ClientResult<CartView>;
  async fn count(&self) -> ClientResult<i64>;
  /// Adds to the existing row for the product, or creates one.
  async fn add(&self, product_id: Uuid, quantity: i32) -> ClientResult<CartItem>;
  /// Overwrites the quantity as given.
  async fn update(&self, cart_id: Uuid, quantity: i32) -> ClientResult<CartItem>;
  async fn remove(&self, cart_id: Uuid) -> ClientResult<()>;
  async fn clear(&self) -> ClientResult<()>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemEnvelope {
  cart_item: CartItem,
}

#[derive(Deserialize)]
struct CountEnvelope {
  count: i64,
}

pub struct HttpServerCart {
  conn: ApiConnection,
}

impl HttpServerCart {
  pub fn new(conn: ApiConnection) -> Self {
    Self { conn }
  }
}

#[async_trait]
impl ServerCart for HttpServerCart {
  async fn fetch(&self) -> ClientResult<CartView> {
    self.conn.get("/cart", AuthMode::Required).await
  }

  async fn count(&self) -> ClientResult<i64> {
    let body: CountEnvelope = self.conn.get("/cart/count", AuthMode::Required).await?;
    Ok(body.count)
  }

  async fn add(&self, product_id: Uuid, quantity: i32) -> ClientResult<CartItem> {
    let body: CartItemEnvelope = self
      .conn
      .post("/cart", json!({ "productId": product_id, "quantity": quantity }), AuthMode::Required)
      .await?;
    Ok(body.cart_item)
  }

  async fn update(&self, cart_id: Uuid, quantity: i32) -> ClientResult<CartItem> {
    let body: CartItemEnvelope = self
      .conn
      .put(&format!("/cart/{}", cart_id), json!({ "quantity": quantity }), AuthMode::Required)
      .await?;
    Ok(body.cart_item)
  }

  async fn remove(&self, cart_id: Uuid) -> ClientResult<()> {
    let _: Value = self.conn.delete(&format!("/cart/{}", cart_id), AuthMode::Required).await?;
    Ok(())
  }

  async fn clear(&self) -> ClientResult<()> {
    let _: Value = self.conn.delete("/cart", AuthMode::Required).await?;
    Ok(())
  }
}
