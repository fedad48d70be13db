// storefront/src/repo/postgres.rs

use super::{
  CartRepository, NewOrderLine, OrderRepository, OtpRepository, ProductRepository, SessionRepository,
  UserRepository,
};
use crate::errors::Result;
use crate::models::{CartItem, Order, OrderItem, OrderStatus, OtpChallenge, Product, Session, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
  "id, name, description, price_cents, discount_percent, stock_quantity, image_url, category, created_at, updated_at";
const CART_COLUMNS: &str = "id, user_id, product_id, quantity, added_at";
const ORDER_COLUMNS: &str = "id, user_id, status, total_cents, currency, created_at, updated_at";

/// A `cart_items` row joined with its product, flattened for `FromRow`.
#[derive(FromRow)]
struct CartProductRow {
  id: Uuid,
  user_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  added_at: DateTime<Utc>,
  name: String,
  description: Option<String>,
  price_cents: i64,
  discount_percent: i32,
  stock_quantity: i32,
  image_url: Option<String>,
  category: Option<String>,
  product_created_at: DateTime<Utc>,
  product_updated_at: DateTime<Utc>,
}

impl CartProductRow {
  fn split(self) -> (CartItem, Product) {
    (
      CartItem {
        id: self.id,
        user_id: self.user_id,
        product_id: self.product_id,
        quantity: self.quantity,
        added_at: self.added_at,
      },
      Product {
        id: self.product_id,
        name: self.name,
        description: self.description,
        price_cents: self.price_cents,
        discount_percent: self.discount_percent,
        stock_quantity: self.stock_quantity,
        image_url: self.image_url,
        category: self.category,
        created_at: self.product_created_at,
        updated_at: self.product_updated_at,
      },
    )
  }
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Inserts products that are not present yet. Existing rows are left untouched.
  #[instrument(name = "pg::seed_products", skip_all, fields(count = products.len()))]
  pub async fn seed_products(&self, products: &[Product]) -> Result<u64> {
    let mut inserted = 0;
    for p in products {
      let result = sqlx::query(
        "INSERT INTO products (id, name, description, price_cents, discount_percent, stock_quantity, image_url, category, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) \
         ON CONFLICT (id) DO NOTHING",
      )
      .bind(p.id)
      .bind(&p.name)
      .bind(&p.description)
      .bind(p.price_cents)
      .bind(p.discount_percent)
      .bind(p.stock_quantity)
      .bind(&p.image_url)
      .bind(&p.category)
      .execute(&self.pool)
      .await?;
      inserted += result.rows_affected();
    }
    info!(inserted, "Seeded demo products.");
    Ok(inserted)
  }
}

#[async_trait]
impl ProductRepository for PgStore {
  async fn list(&self) -> Result<Vec<Product>> {
    let sql = format!("SELECT {} FROM products ORDER BY name ASC", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
  }

  async fn find(&self, product_id: Uuid) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }
}

#[async_trait]
impl CartRepository for PgStore {
  async fn add_or_increment(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let sql = format!(
      "INSERT INTO cart_items (id, user_id, product_id, quantity, added_at) \
       VALUES ($1, $2, $3, $4, NOW()) \
       ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
       RETURNING {}",
      CART_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, CartItem>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn find_by_product(&self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
    let sql = format!(
      "SELECT {} FROM cart_items WHERE user_id = $1 AND product_id = $2",
      CART_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, CartItem>(&sql)
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn update_quantity(&self, user_id: Uuid, cart_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let sql = format!(
      "UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2 RETURNING {}",
      CART_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, CartItem>(&sql)
        .bind(cart_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn remove(&self, user_id: Uuid, cart_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
      .bind(cart_id)
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn clear(&self, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn list_with_products(&self, user_id: Uuid) -> Result<Vec<(CartItem, Product)>> {
    let rows = sqlx::query_as::<_, CartProductRow>(
      "SELECT c.id, c.user_id, c.product_id, c.quantity, c.added_at, \
              p.name, p.description, p.price_cents, p.discount_percent, p.stock_quantity, \
              p.image_url, p.category, p.created_at AS product_created_at, p.updated_at AS product_updated_at \
       FROM cart_items c JOIN products p ON p.id = c.product_id \
       WHERE c.user_id = $1 \
       ORDER BY c.added_at ASC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows.into_iter().map(CartProductRow::split).collect())
  }

  async fn count(&self, user_id: Uuid) -> Result<i64> {
    Ok(
      sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?,
    )
  }
}

#[async_trait]
impl UserRepository for PgStore {
  async fn find_or_create_by_email(&self, email: &str) -> Result<User> {
    Ok(
      sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) \
         ON CONFLICT (email) DO UPDATE SET updated_at = NOW() \
         RETURNING id, email, created_at, updated_at",
      )
      .bind(Uuid::new_v4())
      .bind(email)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>("SELECT id, email, created_at, updated_at FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
    Ok(
      sqlx::query_as::<_, User>("SELECT id, email, created_at, updated_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }
}

#[async_trait]
impl OtpRepository for PgStore {
  async fn replace(&self, email: &str, code_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
      "INSERT INTO otp_challenges (email, code_hash, expires_at, attempts, created_at) \
       VALUES ($1, $2, $3, 0, NOW()) \
       ON CONFLICT (email) DO UPDATE SET code_hash = EXCLUDED.code_hash, expires_at = EXCLUDED.expires_at, \
       attempts = 0, created_at = NOW()",
    )
    .bind(email)
    .bind(code_hash)
    .bind(expires_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn find(&self, email: &str) -> Result<Option<OtpChallenge>> {
    Ok(
      sqlx::query_as::<_, OtpChallenge>(
        "SELECT email, code_hash, expires_at, attempts, created_at FROM otp_challenges WHERE email = $1",
      )
      .bind(email)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn record_failed_attempt(&self, email: &str) -> Result<Option<i32>> {
    Ok(
      sqlx::query_scalar::<_, i32>(
        "UPDATE otp_challenges SET attempts = attempts + 1 WHERE email = $1 RETURNING attempts",
      )
      .bind(email)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn delete(&self, email: &str) -> Result<()> {
    sqlx::query("DELETE FROM otp_challenges WHERE email = $1")
      .bind(email)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}

#[async_trait]
impl SessionRepository for PgStore {
  async fn create(&self, session: &Session) -> Result<()> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)")
      .bind(&session.token)
      .bind(session.user_id)
      .bind(session.expires_at)
      .bind(session.created_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn find_active(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
    Ok(
      sqlx::query_as::<_, Session>(
        "SELECT token, user_id, expires_at, created_at FROM sessions WHERE token = $1 AND expires_at > $2",
      )
      .bind(token)
      .bind(now)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn revoke(&self, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
      .bind(token)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "pg::place_order", skip(self, lines), fields(line_count = lines.len()), err)]
  async fn place_order(
    &self,
    user_id: Uuid,
    lines: &[NewOrderLine],
    total_cents: i64,
    currency: &str,
  ) -> Result<(Order, Vec<OrderItem>)> {
    let mut tx = self.pool.begin().await?;

    let sql = format!(
      "INSERT INTO orders (id, user_id, status, total_cents, currency, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {}",
      ORDER_COLUMNS
    );
    let order = sqlx::query_as::<_, Order>(&sql)
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(OrderStatus::Pending)
      .bind(total_cents)
      .bind(currency)
      .fetch_one(&mut *tx)
      .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
      let item = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (id, order_id, product_id, quantity, price_at_purchase_cents) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, order_id, product_id, quantity, price_at_purchase_cents",
      )
      .bind(Uuid::new_v4())
      .bind(order.id)
      .bind(line.product_id)
      .bind(line.quantity)
      .bind(line.price_at_purchase_cents)
      .fetch_one(&mut *tx)
      .await?;
      items.push(item);
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok((order, items))
  }

  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?,
    )
  }
}
