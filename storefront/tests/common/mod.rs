// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use storefront::client::{ClientError, ClientResult, ProductRef, ServerCart};
use storefront::config::AppConfig;
use storefront::models::{CartItem, CartView, Product, Session};
use storefront::repo::{CartRepository, MemoryStore, Repositories};
use storefront::services::email_mock::MockMailer;
use storefront::state::AppState;
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn test_config() -> AppConfig {
  AppConfig {
    otp_max_attempts: 3,
    ..AppConfig::default()
  }
}

pub fn product(name: &str, price_cents: i64, discount_percent: i32, stock_quantity: i32) -> Product {
  let now = Utc::now();
  Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    description: None,
    price_cents,
    discount_percent,
    stock_quantity,
    image_url: Some(format!("/img/{}.jpg", name.to_lowercase().replace(' ', "-"))),
    category: Some("test".to_string()),
    created_at: now,
    updated_at: now,
  }
}

pub struct TestBackend {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
}

impl TestBackend {
  pub fn new(products: Vec<Product>) -> Self {
    Self::with_config(products, test_config())
  }

  pub fn with_config(products: Vec<Product>, config: AppConfig) -> Self {
    let store = Arc::new(MemoryStore::with_products(products));
    let mailer = Arc::new(MockMailer::with_outbox(config.mock_email_sender.clone()));
    let state = AppState::with_mailer(Repositories::in_memory(store.clone()), Arc::new(config), mailer);
    Self { state, store }
  }

  /// Creates an account with a live session, bypassing the code exchange.
  pub async fn session_for(&self, email: &str) -> (String, Uuid) {
    self.session_expiring_in(email, Duration::hours(1)).await
  }

  pub async fn session_expiring_in(&self, email: &str, ttl: Duration) -> (String, Uuid) {
    let user = self.state.repos.users.find_or_create_by_email(email).await.unwrap();
    let now = Utc::now();
    let token = format!("test-token-{}", Uuid::new_v4().simple());
    self
      .state
      .repos
      .sessions
      .create(&Session {
        token: token.clone(),
        user_id: user.id,
        expires_at: now + ttl,
        created_at: now - Duration::hours(2),
      })
      .await
      .unwrap();
    (token, user.id)
  }

  /// The code from the most recent sign-in email sent to `email`.
  pub fn last_code_sent_to(&self, email: &str) -> String {
    let mail = self.state.mailer.sent_to(email).pop().expect("no email sent");
    let start = mail.body.find("<strong>").expect("no code in email") + "<strong>".len();
    let end = mail.body[start..].find("</strong>").expect("unterminated code") + start;
    mail.body[start..end].to_string()
  }
}

pub fn bearer(token: &str) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", token))
}

/// A `ServerCart` that talks to the in-memory repositories directly, with
/// optional per-product failures.
pub struct RepoServerCart {
  store: Arc<MemoryStore>,
  user_id: Uuid,
  failing_products: Mutex<HashSet<Uuid>>,
  delay: Option<std::time::Duration>,
  pub add_calls: Mutex<Vec<(Uuid, i32)>>,
}

impl RepoServerCart {
  pub fn new(store: Arc<MemoryStore>, user_id: Uuid) -> Self {
    Self {
      store,
      user_id,
      failing_products: Mutex::new(HashSet::new()),
      delay: None,
      add_calls: Mutex::new(Vec::new()),
    }
  }

  pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn fail_adds_for(&self, product_id: Uuid) {
    self.failing_products.lock().insert(product_id);
  }
}

fn internal(e: storefront::errors::AppError) -> ClientError {
  ClientError::Server {
    status: 500,
    message: e.to_string(),
  }
}

#[async_trait]
impl ServerCart for RepoServerCart {
  async fn fetch(&self) -> ClientResult<CartView> {
    let rows = self.store.list_with_products(self.user_id).await.map_err(internal)?;
    Ok(CartView::from_rows(rows))
  }

  async fn count(&self) -> ClientResult<i64> {
    self.store.count(self.user_id).await.map_err(internal)
  }

  async fn add(&self, product_id: Uuid, quantity: i32) -> ClientResult<CartItem> {
    self.add_calls.lock().push((product_id, quantity));
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if self.failing_products.lock().contains(&product_id) {
      return Err(ClientError::Transport("connection reset".to_string()));
    }
    self
      .store
      .add_or_increment(self.user_id, product_id, quantity)
      .await
      .map_err(internal)
  }

  async fn update(&self, cart_id: Uuid, quantity: i32) -> ClientResult<CartItem> {
    self
      .store
      .update_quantity(self.user_id, cart_id, quantity)
      .await
      .map_err(internal)?
      .ok_or(ClientError::Server {
        status: 404,
        message: "Cart item not found.".to_string(),
      })
  }

  async fn remove(&self, cart_id: Uuid) -> ClientResult<()> {
    if self.store.remove(self.user_id, cart_id).await.map_err(internal)? {
      Ok(())
    } else {
      Err(ClientError::Server {
        status: 404,
        message: "Cart item not found.".to_string(),
      })
    }
  }

  async fn clear(&self) -> ClientResult<()> {
    self.store.clear(self.user_id).await.map_err(internal)?;
    Ok(())
  }
}

pub fn product_ref(p: &Product) -> ProductRef {
  ProductRef::from(p)
}
