// storefront/src/repo/mod.rs

//! Persistence ports used by the pipelines and handlers, with a Postgres
//! adapter for production and an in-memory adapter for local runs and tests.

pub mod memory;
pub mod postgres;
pub mod seed;

use crate::errors::Result;
use crate::models::{CartItem, Order, OrderItem, OtpChallenge, Product, Session, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ProductRepository: Send + Sync {
  async fn list(&self) -> Result<Vec<Product>>;
  async fn find(&self, product_id: Uuid) -> Result<Option<Product>>;
}

/// Server cart storage. One row per `(user_id, product_id)`.
#[async_trait]
pub trait CartRepository: Send + Sync {
  /// Atomic insert-or-increment keyed on `(user_id, product_id)`.
  async fn add_or_increment(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem>;

  async fn find_by_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>>;

  /// Overwrites the quantity as given. Non-positive values are not rejected here.
  async fn update_quantity(&self, user_id: Uuid, cart_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;

  async fn remove(&self, user_id: Uuid, cart_id: Uuid) -> Result<bool>;

  async fn clear(&self, user_id: Uuid) -> Result<u64>;

  /// Rows joined with their live products, oldest first.
  async fn list_with_products(&self, user_id: Uuid) -> Result<Vec<(CartItem, Product)>>;

  /// Sum of quantities across the user's rows.
  async fn count(&self, user_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
  async fn find_or_create_by_email(&self, email: &str) -> Result<User>;
  async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
  /// Stores a fresh challenge for `email`, replacing any previous one and resetting attempts.
  async fn replace(&self, email: &str, code_hash: &str, expires_at: DateTime<Utc>) -> Result<()>;
  async fn find(&self, email: &str) -> Result<Option<OtpChallenge>>;
  /// Returns the new attempt count, or `None` when no challenge exists.
  async fn record_failed_attempt(&self, email: &str) -> Result<Option<i32>>;
  async fn delete(&self, email: &str) -> Result<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
  async fn create(&self, session: &Session) -> Result<()>;
  async fn find_active(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>>;
  async fn revoke(&self, token: &str) -> Result<bool>;
}

/// A priced line to freeze into an order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_at_purchase_cents: i64,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Creates the order with its lines and deletes the user's cart rows, all or nothing.
  async fn place_order(
    &self,
    user_id: Uuid,
    lines: &[NewOrderLine],
    total_cents: i64,
    currency: &str,
  ) -> Result<(Order, Vec<OrderItem>)>;

  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;
}

/// The full set of ports, as held by `AppState`.
#[derive(Clone)]
pub struct Repositories {
  pub products: Arc<dyn ProductRepository>,
  pub carts: Arc<dyn CartRepository>,
  pub users: Arc<dyn UserRepository>,
  pub otps: Arc<dyn OtpRepository>,
  pub sessions: Arc<dyn SessionRepository>,
  pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
  pub fn postgres(store: PgStore) -> Self {
    let store = Arc::new(store);
    Self {
      products: store.clone(),
      carts: store.clone(),
      users: store.clone(),
      otps: store.clone(),
      sessions: store.clone(),
      orders: store,
    }
  }

  pub fn in_memory(store: Arc<MemoryStore>) -> Self {
    Self {
      products: store.clone(),
      carts: store.clone(),
      users: store.clone(),
      otps: store.clone(),
      sessions: store.clone(),
      orders: store,
    }
  }
}
