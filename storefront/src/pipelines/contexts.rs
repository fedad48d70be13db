// storefront/src/pipelines/contexts.rs

//! Context data carried through each pipeline. Handlers receive these wrapped
//! in `flow::ContextData`.

use crate::models::{CartItem, Order, OrderItem, OtpChallenge, Product, Session, User};
use crate::repo::NewOrderLine;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub product_id: Option<Uuid>,
  pub quantity: i32,
  pub product: Option<Product>,
  pub cart_item: Option<CartItem>,
}

impl AddToCartCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, product_id: Option<Uuid>, quantity: i32) -> Self {
    Self {
      app_state,
      user_id,
      product_id,
      quantity,
      product: None,
      cart_item: None,
    }
  }
}

#[derive(Clone)]
pub struct OtpRequestCtxData {
  pub app_state: AppState,
  pub raw_email: String,
  pub email: Option<String>,
  pub user: Option<User>,
  pub code: Option<String>,
  pub expires_at: Option<DateTime<Utc>>,
  pub message_id: Option<String>,
}

impl OtpRequestCtxData {
  pub fn new(app_state: AppState, raw_email: String) -> Self {
    Self {
      app_state,
      raw_email,
      email: None,
      user: None,
      code: None,
      expires_at: None,
      message_id: None,
    }
  }
}

#[derive(Clone)]
pub struct OtpVerifyCtxData {
  pub app_state: AppState,
  pub raw_email: String,
  pub code: String,
  pub email: Option<String>,
  pub challenge: Option<OtpChallenge>,
  pub user: Option<User>,
  pub session: Option<Session>,
}

impl OtpVerifyCtxData {
  pub fn new(app_state: AppState, raw_email: String, code: String) -> Self {
    Self {
      app_state,
      raw_email,
      code,
      email: None,
      challenge: None,
      user: None,
      session: None,
    }
  }
}

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub currency: String,
  pub cart_rows: Vec<(CartItem, Product)>,
  pub lines: Vec<NewOrderLine>,
  pub total_cents: i64,
  pub order: Option<Order>,
  pub order_items: Vec<OrderItem>,
  pub confirmation_message_id: Option<String>,
}

impl PlaceOrderCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, currency: String) -> Self {
    Self {
      app_state,
      user_id,
      currency,
      cart_rows: Vec::new(),
      lines: Vec::new(),
      total_cents: 0,
      order: None,
      order_items: Vec::new(),
      confirmation_message_id: None,
    }
  }
}
