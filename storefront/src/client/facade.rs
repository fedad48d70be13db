// storefront/src/client/facade.rs

//! `CartFacade` is the only cart entry point UI code uses.
//!
//! Each call asks the `IdentityResolver` which store applies. Signed-in
//! mutations are followed by a full re-fetch of the account cart; guest
//! mutations update local state immediately. Explicit actions return a
//! `CartError`; background refreshes never fail and fall back to the guest cart.

use crate::client::errors::{CartError, ClientError};
use crate::client::guest::{CartChanged, CartSource, GuestCartStore};
use crate::client::identity::IdentityResolver;
use crate::client::merge::{MergeReport, MergeTrigger};
use crate::client::product_ref::ProductRef;
use crate::client::server::ServerCart;
use crate::models::CartView;
use crate::pricing;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
  /// Row id for account carts, product id for guest carts.
  pub line_id: Uuid,
  pub product: ProductRef,
  pub quantity: i32,
  pub unit_price: f64,
  pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
  pub source: CartSource,
  pub entries: Vec<CartEntry>,
  pub total: f64,
  pub count: i64,
}

impl CartSnapshot {
  fn empty() -> Self {
    Self {
      source: CartSource::Guest,
      entries: Vec::new(),
      total: 0.0,
      count: 0,
    }
  }

  fn from_guest(guest: &GuestCartStore) -> Self {
    let entries = guest
      .lines()
      .into_iter()
      .map(|line| {
        let unit_cents = line.product.price_cents as f64;
        CartEntry {
          line_id: line.line_id(),
          unit_price: pricing::round2(pricing::cents_to_units(unit_cents)),
          line_total: pricing::round2(pricing::cents_to_units(unit_cents * f64::from(line.quantity))),
          quantity: line.quantity,
          product: line.product,
        }
      })
      .collect();
    Self {
      source: CartSource::Guest,
      entries,
      total: guest.total(),
      count: guest.count(),
    }
  }

  fn from_view(view: CartView) -> Self {
    Self {
      source: CartSource::Account,
      total: view.total,
      count: view.item_count,
      entries: view
        .items
        .into_iter()
        .map(|item| CartEntry {
          line_id: item.id,
          product: ProductRef::from(&item.product),
          quantity: item.quantity,
          unit_price: item.unit_price,
          line_total: item.line_total,
        })
        .collect(),
    }
  }
}

pub struct CartFacade {
  identity: IdentityResolver,
  guest: Arc<GuestCartStore>,
  server: Arc<dyn ServerCart>,
  merge: MergeTrigger,
  snapshot: RwLock<CartSnapshot>,
  events: broadcast::Sender<CartChanged>,
}

impl CartFacade {
  pub fn new(identity: IdentityResolver, guest: Arc<GuestCartStore>, server: Arc<dyn ServerCart>) -> Self {
    let (events, _) = broadcast::channel(32);
    Self {
      merge: MergeTrigger::new(guest.clone(), server.clone()),
      snapshot: RwLock::new(CartSnapshot::from_guest(&guest)),
      identity,
      guest,
      server,
      events,
    }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
    self.events.subscribe()
  }

  pub fn snapshot(&self) -> CartSnapshot {
    self.snapshot.read().clone()
  }

  pub fn total(&self) -> f64 {
    self.snapshot.read().total
  }

  pub fn count(&self) -> i64 {
    self.snapshot.read().count
  }

  pub fn merge_trigger(&self) -> &MergeTrigger {
    &self.merge
  }

  /// Reloads from whichever store applies. A failed account fetch falls back to the guest cart.
  #[instrument(name = "cart_facade::refresh", skip(self))]
  pub async fn refresh(&self) -> CartSnapshot {
    let snapshot = if self.identity.is_authenticated() {
      match self.server.fetch().await {
        Ok(view) => CartSnapshot::from_view(view),
        Err(e) => {
          warn!(error = %e, "Account cart unavailable; showing the guest cart.");
          CartSnapshot::from_guest(&self.guest)
        }
      }
    } else {
      CartSnapshot::from_guest(&self.guest)
    };
    self.publish(snapshot)
  }

  #[instrument(name = "cart_facade::add", skip(self, product), fields(product_id = %product.id))]
  pub async fn add(&self, product: &ProductRef, quantity: i32) -> Result<CartSnapshot, CartError> {
    if quantity <= 0 {
      return Err(CartError::Validation("Quantity must be a positive number.".to_string()));
    }
    if self.identity.is_authenticated() {
      self.server.add(product.id, quantity).await.map_err(user_facing)?;
      Ok(self.refresh().await)
    } else {
      self.guest.add(product.clone(), quantity).map_err(user_facing)?;
      Ok(self.publish(CartSnapshot::from_guest(&self.guest)))
    }
  }

  /// `quantity <= 0` removes the line.
  #[instrument(name = "cart_facade::update", skip(self))]
  pub async fn update(&self, line_id: Uuid, quantity: i32) -> Result<CartSnapshot, CartError> {
    if quantity <= 0 {
      return self.remove(line_id).await;
    }
    if self.identity.is_authenticated() {
      self.server.update(line_id, quantity).await.map_err(user_facing)?;
      Ok(self.refresh().await)
    } else {
      self.guest.update(line_id, quantity).map_err(user_facing)?;
      Ok(self.publish(CartSnapshot::from_guest(&self.guest)))
    }
  }

  #[instrument(name = "cart_facade::remove", skip(self))]
  pub async fn remove(&self, line_id: Uuid) -> Result<CartSnapshot, CartError> {
    if self.identity.is_authenticated() {
      self.server.remove(line_id).await.map_err(user_facing)?;
      Ok(self.refresh().await)
    } else {
      self.guest.remove(line_id).map_err(user_facing)?;
      Ok(self.publish(CartSnapshot::from_guest(&self.guest)))
    }
  }

  #[instrument(name = "cart_facade::clear", skip(self))]
  pub async fn clear(&self) -> Result<CartSnapshot, CartError> {
    if self.identity.is_authenticated() {
      self.server.clear().await.map_err(user_facing)?;
      Ok(self.refresh().await)
    } else {
      self.guest.clear().map_err(user_facing)?;
      Ok(self.publish(CartSnapshot::from_guest(&self.guest)))
    }
  }

  /// Stores the new session token, then drains the guest cart into the account.
  #[instrument(name = "cart_facade::on_login", skip_all)]
  pub async fn on_login(&self, token: &str) -> Result<MergeReport, CartError> {
    self.identity.remember(token).map_err(user_facing)?;
    let Some(report) = self.merge.trigger().await else {
      // A drain is already running; show the account cart as it stands.
      self.refresh().await;
      return Ok(MergeReport::default());
    };
    match report.server_cart.clone() {
      Some(view) => {
        self.publish(CartSnapshot::from_view(view));
      }
      None => {
        self.refresh().await;
      }
    }
    if report.failed > 0 {
      info!(failed = report.failed, "Some guest lines were not carried over.");
    }
    Ok(report)
  }

  #[instrument(name = "cart_facade::on_logout", skip(self))]
  pub async fn on_logout(&self) -> Result<CartSnapshot, CartError> {
    self.identity.forget().map_err(user_facing)?;
    Ok(self.publish(CartSnapshot::from_guest(&self.guest)))
  }

  fn publish(&self, snapshot: CartSnapshot) -> CartSnapshot {
    *self.snapshot.write() = snapshot.clone();
    let _ = self.events.send(CartChanged {
      source: snapshot.source,
    });
    snapshot
  }
}

fn user_facing(err: ClientError) -> CartError {
  let cart_err = CartError::from(err);
  warn!(error = %cart_err, "Cart action failed.");
  cart_err
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::client::guest::MemoryGuestCartRepository;
  use crate::client::identity::{MemoryTokenStore, TokenStore};

  struct OfflineServer;

  #[async_trait::async_trait]
  impl ServerCart for OfflineServer {
    async fn fetch(&self) -> crate::client::errors::ClientResult<CartView> {
      Err(ClientError::Transport("offline".into()))
    }
    async fn count(&self) -> crate::client::errors::ClientResult<i64> {
      Err(ClientError::Transport("offline".into()))
    }
    async fn add(&self, _: Uuid, _: i32) -> crate::client::errors::ClientResult<crate::models::CartItem> {
      Err(ClientError::Transport("offline".into()))
    }
    async fn update(&self, _: Uuid, _: i32) -> crate::client::errors::ClientResult<crate::models::CartItem> {
      Err(ClientError::Transport("offline".into()))
    }
    async fn remove(&self, _: Uuid) -> crate::client::errors::ClientResult<()> {
      Err(ClientError::Transport("offline".into()))
    }
    async fn clear(&self) -> crate::client::errors::ClientResult<()> {
      Err(ClientError::Transport("offline".into()))
    }
  }

  fn product() -> ProductRef {
    ProductRef {
      id: Uuid::new_v4(),
      name: "Kettle".into(),
      price_cents: 4500,
      image_url: None,
      category: None,
    }
  }

  fn facade(tokens: Arc<MemoryTokenStore>) -> CartFacade {
    let guest = Arc::new(GuestCartStore::load(Arc::new(MemoryGuestCartRepository::new())));
    CartFacade::new(IdentityResolver::new(tokens), guest, Arc::new(OfflineServer))
  }

  #[tokio::test]
  async fn refresh_falls_back_to_guest_cart_when_server_is_unreachable() {
    let tokens = Arc::new(MemoryTokenStore::new());
    let facade = facade(tokens.clone());
    facade.add(&product(), 2).await.unwrap();

    tokens.set_token("stale").unwrap();
    let snapshot = facade.refresh().await;
    assert_eq!(snapshot.source, CartSource::Guest);
    assert_eq!(snapshot.count, 2);
  }

  #[tokio::test]
  async fn explicit_actions_surface_unavailable() {
    let tokens = Arc::new(MemoryTokenStore::new());
    tokens.set_token("tok").unwrap();
    let facade = facade(tokens);
    let err = facade.add(&product(), 1).await.unwrap_err();
    assert!(matches!(err, CartError::Unavailable(_)));
  }

  #[tokio::test]
  async fn non_positive_add_is_rejected() {
    let facade = facade(Arc::new(MemoryTokenStore::new()));
    assert!(matches!(facade.add(&product(), 0).await, Err(CartError::Validation(_))));
  }
}
