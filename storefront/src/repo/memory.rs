// storefront/src/repo/memory.rs

//! In-process adapter for every repository port. A single mutex guards all
//! tables so multi-table operations (order placement) stay atomic.

use super::{
  CartRepository, NewOrderLine, OrderRepository, OtpRepository, ProductRepository, SessionRepository,
  UserRepository,
};
use crate::errors::{AppError, Result};
use crate::models::{CartItem, Order, OrderItem, OrderStatus, OtpChallenge, Product, Session, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  products: Vec<Product>,
  cart_items: Vec<CartItem>,
  users: HashMap<String, User>,
  otps: HashMap<String, OtpChallenge>,
  sessions: HashMap<String, Session>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_products(products: Vec<Product>) -> Self {
    let store = Self::new();
    store.tables.lock().products = products;
    store
  }

  /// Inserts or replaces a product by id.
  pub fn put_product(&self, product: Product) {
    let mut tables = self.tables.lock();
    match tables.products.iter_mut().find(|p| p.id == product.id) {
      Some(existing) => *existing = product,
      None => tables.products.push(product),
    }
  }

  pub fn order_items_for(&self, order_id: Uuid) -> Vec<OrderItem> {
    self
      .tables
      .lock()
      .order_items
      .iter()
      .filter(|i| i.order_id == order_id)
      .cloned()
      .collect()
  }

  /// Raw cart rows for a user, in insertion order.
  pub fn cart_rows(&self, user_id: Uuid) -> Vec<CartItem> {
    self
      .tables
      .lock()
      .cart_items
      .iter()
      .filter(|i| i.user_id == user_id)
      .cloned()
      .collect()
  }
}

#[async_trait]
impl ProductRepository for MemoryStore {
  async fn list(&self) -> Result<Vec<Product>> {
    let mut products = self.tables.lock().products.clone();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn find(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.iter().find(|p| p.id == product_id).cloned())
  }
}

#[async_trait]
impl CartRepository for MemoryStore {
  async fn add_or_increment(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let mut tables = self.tables.lock();
    if let Some(row) = tables
      .cart_items
      .iter_mut()
      .find(|i| i.user_id == user_id && i.product_id == product_id)
    {
      row.quantity = row
        .quantity
        .checked_add(quantity)
        .ok_or_else(|| AppError::Validation("Quantity is too large.".to_string()))?;
      return Ok(row.clone());
    }
    let row = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    };
    tables.cart_items.push(row.clone());
    Ok(row)
  }

  async fn find_by_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
    Ok(
      self
        .tables
        .lock()
        .cart_items
        .iter()
        .find(|i| i.user_id == user_id && i.product_id == product_id)
        .cloned(),
    )
  }

  async fn update_quantity(&self, user_id: Uuid, cart_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let mut tables = self.tables.lock();
    Ok(
      tables
        .cart_items
        .iter_mut()
        .find(|i| i.id == cart_id && i.user_id == user_id)
        .map(|row| {
          row.quantity = quantity;
          row.clone()
        }),
    )
  }

  async fn remove(&self, user_id: Uuid, cart_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let before = tables.cart_items.len();
    tables.cart_items.retain(|i| !(i.id == cart_id && i.user_id == user_id));
    Ok(tables.cart_items.len() != before)
  }

  async fn clear(&self, user_id: Uuid) -> Result<u64> {
    let mut tables = self.tables.lock();
    let before = tables.cart_items.len();
    tables.cart_items.retain(|i| i.user_id != user_id);
    Ok((before - tables.cart_items.len()) as u64)
  }

  async fn list_with_products(&self, user_id: Uuid) -> Result<Vec<(CartItem, Product)>> {
    let tables = self.tables.lock();
    let mut rows: Vec<(CartItem, Product)> = tables
      .cart_items
      .iter()
      .filter(|i| i.user_id == user_id)
      .filter_map(|item| {
        tables
          .products
          .iter()
          .find(|p| p.id == item.product_id)
          .map(|p| (item.clone(), p.clone()))
      })
      .collect();
    rows.sort_by_key(|(item, _)| item.added_at);
    Ok(rows)
  }

  async fn count(&self, user_id: Uuid) -> Result<i64> {
    Ok(
      self
        .tables
        .lock()
        .cart_items
        .iter()
        .filter(|i| i.user_id == user_id)
        .map(|i| i64::from(i.quantity))
        .sum(),
    )
  }
}

#[async_trait]
impl UserRepository for MemoryStore {
  async fn find_or_create_by_email(&self, email: &str) -> Result<User> {
    let mut tables = self.tables.lock();
    let now = Utc::now();
    let user = tables.users.entry(email.to_string()).or_insert_with(|| User {
      id: Uuid::new_v4(),
      email: email.to_string(),
      created_at: now,
      updated_at: now,
    });
    user.updated_at = now;
    Ok(user.clone())
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.tables.lock().users.get(email).cloned())
  }

  async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.lock().users.values().find(|u| u.id == user_id).cloned())
  }
}

#[async_trait]
impl OtpRepository for MemoryStore {
  async fn replace(&self, email: &str, code_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
    self.tables.lock().otps.insert(
      email.to_string(),
      OtpChallenge {
        email: email.to_string(),
        code_hash: code_hash.to_string(),
        expires_at,
        attempts: 0,
        created_at: Utc::now(),
      },
    );
    Ok(())
  }

  async fn find(&self, email: &str) -> Result<Option<OtpChallenge>> {
    Ok(self.tables.lock().otps.get(email).cloned())
  }

  async fn record_failed_attempt(&self, email: &str) -> Result<Option<i32>> {
    Ok(self.tables.lock().otps.get_mut(email).map(|c| {
      c.attempts += 1;
      c.attempts
    }))
  }

  async fn delete(&self, email: &str) -> Result<()> {
    self.tables.lock().otps.remove(email);
    Ok(())
  }
}

#[async_trait]
impl SessionRepository for MemoryStore {
  async fn create(&self, session: &Session) -> Result<()> {
    let mut tables = self.tables.lock();
    if tables.sessions.contains_key(&session.token) {
      return Err(AppError::Conflict("Session token already exists.".to_string()));
    }
    tables.sessions.insert(session.token.clone(), session.clone());
    Ok(())
  }

  async fn find_active(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
    Ok(
      self
        .tables
        .lock()
        .sessions
        .get(token)
        .filter(|s| s.expires_at > now)
        .cloned(),
    )
  }

  async fn revoke(&self, token: &str) -> Result<bool> {
    Ok(self.tables.lock().sessions.remove(token).is_some())
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn place_order(
    &self,
    user_id: Uuid,
    lines: &[NewOrderLine],
    total_cents: i64,
    currency: &str,
  ) -> Result<(Order, Vec<OrderItem>)> {
    let mut tables = self.tables.lock();
    let now = Utc::now();
    let order = Order {
      id: Uuid::new_v4(),
      user_id,
      status: OrderStatus::Pending,
      total_cents,
      currency: currency.to_string(),
      created_at: now,
      updated_at: now,
    };
    let items: Vec<OrderItem> = lines
      .iter()
      .map(|line| OrderItem {
        id: Uuid::new_v4(),
        order_id: order.id,
        product_id: line.product_id,
        quantity: line.quantity,
        price_at_purchase_cents: line.price_at_purchase_cents,
      })
      .collect();
    tables.orders.push(order.clone());
    tables.order_items.extend(items.iter().cloned());
    tables.cart_items.retain(|i| i.user_id != user_id);
    Ok((order, items))
  }

  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .lock()
      .orders
      .iter()
      .filter(|o| o.user_id == user_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::repo::seed;

  #[tokio::test]
  async fn repeated_add_keeps_a_single_row() {
    let products = seed::demo_products();
    let product_id = products[0].id;
    let store = MemoryStore::with_products(products);
    let user = Uuid::new_v4();

    store.add_or_increment(user, product_id, 1).await.unwrap();
    let row = store.add_or_increment(user, product_id, 1).await.unwrap();

    assert_eq!(row.quantity, 2);
    assert_eq!(store.cart_rows(user).len(), 1);
  }

  #[tokio::test]
  async fn overflowing_increment_is_rejected() {
    let products = seed::demo_products();
    let product_id = products[0].id;
    let store = MemoryStore::with_products(products);
    let user = Uuid::new_v4();

    store.add_or_increment(user, product_id, i32::MAX).await.unwrap();
    let err = store.add_or_increment(user, product_id, 1).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.cart_rows(user)[0].quantity, i32::MAX);
  }

  #[tokio::test]
  async fn find_by_product_is_scoped_to_the_owner() {
    let products = seed::demo_products();
    let product_id = products[0].id;
    let store = MemoryStore::with_products(products);
    let (owner, other) = (Uuid::new_v4(), Uuid::new_v4());

    store.add_or_increment(owner, product_id, 2).await.unwrap();

    let row = store.find_by_product(owner, product_id).await.unwrap().unwrap();
    assert_eq!(row.quantity, 2);
    assert!(store.find_by_product(other, product_id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn count_sums_quantities_not_rows() {
    let products = seed::demo_products();
    let (a, b) = (products[0].id, products[1].id);
    let store = MemoryStore::with_products(products);
    let user = Uuid::new_v4();

    store.add_or_increment(user, a, 3).await.unwrap();
    store.add_or_increment(user, b, 2).await.unwrap();

    assert_eq!(store.count(user).await.unwrap(), 5);
    assert_eq!(store.count(Uuid::new_v4()).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn direct_overwrite_accepts_non_positive_quantity() {
    let products = seed::demo_products();
    let product_id = products[0].id;
    let store = MemoryStore::with_products(products);
    let user = Uuid::new_v4();
    let row = store.add_or_increment(user, product_id, 2).await.unwrap();

    let updated = store.update_quantity(user, row.id, 0).await.unwrap().unwrap();
    assert_eq!(updated.quantity, 0);
    assert_eq!(store.cart_rows(user).len(), 1);
  }

  #[tokio::test]
  async fn rows_are_scoped_to_their_owner() {
    let products = seed::demo_products();
    let product_id = products[0].id;
    let store = MemoryStore::with_products(products);
    let (owner, intruder) = (Uuid::new_v4(), Uuid::new_v4());
    let row = store.add_or_increment(owner, product_id, 1).await.unwrap();

    assert!(store.update_quantity(intruder, row.id, 5).await.unwrap().is_none());
    assert!(!store.remove(intruder, row.id).await.unwrap());
    assert!(store.remove(owner, row.id).await.unwrap());
  }
}
