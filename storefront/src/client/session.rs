// storefront/src/client/session.rs

//! Catalogue browsing and email one-time-code sign-in, with the guest cart
//! merge fired on successful verification.

use crate::client::errors::{CartError, ClientError, ClientResult};
use crate::client::facade::CartFacade;
use crate::client::http::{ApiConnection, AuthMode};
use crate::client::merge::MergeReport;
use crate::client::product_ref::ProductRef;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token: String,
  pub user_id: Uuid,
  pub email: String,
}

#[derive(Debug, Error)]
pub enum SignInError {
  #[error(transparent)]
  Client(#[from] ClientError),
  #[error(transparent)]
  Cart(#[from] CartError),
}

#[derive(Clone)]
pub struct StorefrontApi {
  conn: ApiConnection,
}

impl StorefrontApi {
  pub fn new(conn: ApiConnection) -> Self {
    Self { conn }
  }

  pub async fn list_products(&self) -> ClientResult<Vec<ProductRef>> {
    let body: Value = self.conn.get("/products", AuthMode::None).await?;
    let items = body
      .get("products")
      .and_then(Value::as_array)
      .ok_or_else(|| ClientError::Decode("Response has no product list.".to_string()))?;
    items.iter().map(ProductRef::from_json).collect()
  }

  pub async fn product(&self, product_id: Uuid) -> ClientResult<ProductRef> {
    let body: Value = self.conn.get(&format!("/products/{}", product_id), AuthMode::None).await?;
    ProductRef::from_json(&body)
  }

  pub async fn request_code(&self, email: &str) -> ClientResult<()> {
    let _: Value = self
      .conn
      .post("/auth/otp/request", json!({ "email": email }), AuthMode::None)
      .await?;
    Ok(())
  }

  pub async fn verify_code(&self, email: &str, code: &str) -> ClientResult<LoginResponse> {
    self
      .conn
      .post("/auth/otp/verify", json!({ "email": email, "code": code }), AuthMode::None)
      .await
  }

  pub async fn logout(&self) -> ClientResult<()> {
    let _: Value = self.conn.post("/auth/logout", json!({}), AuthMode::Required).await?;
    Ok(())
  }
}

pub struct SignIn {
  api: StorefrontApi,
  cart: Arc<CartFacade>,
}

impl SignIn {
  pub fn new(api: StorefrontApi, cart: Arc<CartFacade>) -> Self {
    Self { api, cart }
  }

  pub async fn request_code(&self, email: &str) -> ClientResult<()> {
    self.api.request_code(email).await
  }

  /// Exchanges the code for a session, then merges the guest cart exactly once.
  #[instrument(name = "sign_in::verify", skip(self, code))]
  pub async fn verify(&self, email: &str, code: &str) -> Result<(LoginResponse, MergeReport), SignInError> {
    let login = self.api.verify_code(email, code).await?;
    let report = self.cart.on_login(&login.token).await?;
    info!(user_id = %login.user_id, transferred = report.transferred, "Signed in.");
    Ok((login, report))
  }

  /// Revokes the session server-side when possible; the local token is dropped either way.
  pub async fn sign_out(&self) -> Result<(), SignInError> {
    if let Err(e) = self.api.logout().await {
      warn!(error = %e, "Server-side sign-out failed.");
    }
    self.cart.on_logout().await?;
    Ok(())
  }
}
