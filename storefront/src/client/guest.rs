// storefront/src/client/guest.rs

//! The guest cart: lines kept on this device only, persisted as one JSON list
//! under the `guest_cart` key after every mutation.

use crate::client::errors::{ClientError, ClientResult};
use crate::client::product_ref::ProductRef;
use crate::pricing;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

pub const GUEST_CART_KEY: &str = "guest_cart";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product: ProductRef,
  pub quantity: i32,
}

impl CartLine {
  /// Guest lines are identified by their product.
  pub fn line_id(&self) -> Uuid {
    self.product.id
  }
}

/// Which store a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSource {
  Guest,
  Account,
}

/// Broadcast after every cart change so all open views can re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartChanged {
  pub source: CartSource,
}

/// Raw storage for the serialized guest cart.
pub trait GuestCartRepository: Send + Sync {
  fn load(&self) -> ClientResult<Option<String>>;
  fn save(&self, serialized: &str) -> ClientResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryGuestCartRepository {
  slot: Mutex<Option<String>>,
}

impl MemoryGuestCartRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts with an arbitrary stored value, parseable or not.
  pub fn with_raw(raw: impl Into<String>) -> Self {
    Self {
      slot: Mutex::new(Some(raw.into())),
    }
  }

  pub fn raw(&self) -> Option<String> {
    self.slot.lock().clone()
  }
}

impl GuestCartRepository for MemoryGuestCartRepository {
  fn load(&self) -> ClientResult<Option<String>> {
    Ok(self.slot.lock().clone())
  }

  fn save(&self, serialized: &str) -> ClientResult<()> {
    *self.slot.lock() = Some(serialized.to_string());
    Ok(())
  }
}

/// Stores the cart in `<dir>/guest_cart.json`.
#[derive(Debug, Clone)]
pub struct FileGuestCartRepository {
  path: PathBuf,
}

impl FileGuestCartRepository {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      path: dir.into().join(format!("{}.json", GUEST_CART_KEY)),
    }
  }

  pub fn path(&self) -> &PathBuf {
    &self.path
  }
}

impl GuestCartRepository for FileGuestCartRepository {
  fn load(&self) -> ClientResult<Option<String>> {
    match fs::read_to_string(&self.path) {
      Ok(raw) => Ok(Some(raw)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(ClientError::from(e)),
    }
  }

  fn save(&self, serialized: &str) -> ClientResult<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, serialized)?;
    fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

pub struct GuestCartStore {
  repo: Arc<dyn GuestCartRepository>,
  lines: RwLock<Vec<CartLine>>,
  events: broadcast::Sender<CartChanged>,
}

impl GuestCartStore {
  /// Loads whatever is stored. An unreadable or unparseable value starts an empty cart.
  pub fn load(repo: Arc<dyn GuestCartRepository>) -> Self {
    let lines = match repo.load() {
      Ok(Some(raw)) => serde_json::from_str::<Vec<CartLine>>(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "Stored guest cart is not valid; starting empty.");
        Vec::new()
      }),
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(error = %e, "Could not read stored guest cart; starting empty.");
        Vec::new()
      }
    };
    let (events, _) = broadcast::channel(32);
    Self {
      repo,
      lines: RwLock::new(lines),
      events,
    }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
    self.events.subscribe()
  }

  pub fn lines(&self) -> Vec<CartLine> {
    self.lines.read().clone()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.read().is_empty()
  }

  pub fn add(&self, product: ProductRef, quantity: i32) -> ClientResult<()> {
    self.mutate(|lines| {
      match lines.iter_mut().find(|l| l.product.id == product.id) {
        Some(line) => {
          line.quantity = line
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| ClientError::Validation("Quantity is too large.".to_string()))?;
        }
        None => lines.push(CartLine { product, quantity }),
      }
      Ok(())
    })
  }

  /// A quantity of zero or less removes the line.
  pub fn update(&self, line_id: Uuid, quantity: i32) -> ClientResult<()> {
    if quantity <= 0 {
      return self.remove(line_id);
    }
    self.mutate(|lines| {
      if let Some(line) = lines.iter_mut().find(|l| l.line_id() == line_id) {
        line.quantity = quantity;
      }
      Ok(())
    })
  }

  pub fn remove(&self, line_id: Uuid) -> ClientResult<()> {
    self.mutate(|lines| {
      lines.retain(|l| l.line_id() != line_id);
      Ok(())
    })
  }

  pub fn clear(&self) -> ClientResult<()> {
    self.mutate(|lines| {
      lines.clear();
      Ok(())
    })
  }

  /// List price times quantity. Product discounts are not applied to guest totals.
  pub fn total(&self) -> f64 {
    pricing::guest_total(self.lines.read().iter().map(|l| (l.product.price_cents, l.quantity)))
  }

  pub fn count(&self) -> i64 {
    self.lines.read().iter().map(|l| i64::from(l.quantity)).sum()
  }

  /// Nothing is persisted or broadcast when `f` fails.
  fn mutate(&self, f: impl FnOnce(&mut Vec<CartLine>) -> ClientResult<()>) -> ClientResult<()> {
    let serialized = {
      let mut lines = self.lines.write();
      f(&mut lines)?;
      serde_json::to_string(&*lines).map_err(|e| ClientError::Storage(e.to_string()))?
    };
    self.repo.save(&serialized)?;
    debug!(bytes = serialized.len(), "Guest cart persisted.");
    // No receivers is fine.
    let _ = self.events.send(CartChanged {
      source: CartSource::Guest,
    });
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(price_cents: i64) -> ProductRef {
    ProductRef {
      id: Uuid::new_v4(),
      name: "Lamp".to_string(),
      price_cents,
      image_url: None,
      category: Some("home".to_string()),
    }
  }

  fn store() -> (Arc<MemoryGuestCartRepository>, GuestCartStore) {
    let repo = Arc::new(MemoryGuestCartRepository::new());
    let store = GuestCartStore::load(repo.clone());
    (repo, store)
  }

  #[test]
  fn adding_twice_increments_one_line() {
    let (_, store) = store();
    let p = product(1000);
    store.add(p.clone(), 1).unwrap();
    store.add(p.clone(), 1).unwrap();

    let lines = store.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
  }

  #[test]
  fn overflowing_add_is_rejected_and_leaves_the_line_alone() {
    let (repo, store) = store();
    let p = product(100);
    store.add(p.clone(), i32::MAX).unwrap();
    let persisted = repo.raw();
    let mut rx = store.subscribe();

    let err = store.add(p.clone(), 1).unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(store.lines()[0].quantity, i32::MAX);
    assert_eq!(repo.raw(), persisted);
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn non_positive_update_removes_the_line() {
    let (_, store) = store();
    let (a, b) = (product(100), product(200));
    store.add(a.clone(), 3).unwrap();
    store.add(b.clone(), 3).unwrap();

    store.update(a.id, 0).unwrap();
    store.update(b.id, -1).unwrap();
    assert!(store.is_empty());
  }

  #[test]
  fn count_and_total_ignore_discounts() {
    let (_, store) = store();
    store.add(product(10000), 2).unwrap();
    store.add(product(250), 5).unwrap();
    assert_eq!(store.count(), 7);
    assert_eq!(store.total(), 212.5);
  }

  #[test]
  fn every_mutation_persists_and_reloads() {
    let (repo, store) = store();
    let p = product(499);
    store.add(p.clone(), 2).unwrap();

    let reloaded = GuestCartStore::load(repo.clone());
    assert_eq!(reloaded.lines(), store.lines());

    store.clear().unwrap();
    assert_eq!(repo.raw().as_deref(), Some("[]"));
  }

  #[test]
  fn corrupt_stored_value_loads_as_empty() {
    let repo = Arc::new(MemoryGuestCartRepository::with_raw("{\"not\": \"a list\"}"));
    let store = GuestCartStore::load(repo);
    assert!(store.is_empty());
    assert_eq!(store.total(), 0.0);
  }

  #[test]
  fn mutations_broadcast_a_change() {
    let (_, store) = store();
    let mut rx = store.subscribe();
    store.add(product(100), 1).unwrap();
    assert_eq!(
      rx.try_recv().unwrap(),
      CartChanged {
        source: CartSource::Guest
      }
    );
  }

  #[test]
  fn file_repository_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let p = product(1500);
    {
      let store = GuestCartStore::load(Arc::new(FileGuestCartRepository::new(dir.path())));
      store.add(p.clone(), 4).unwrap();
    }
    let store = GuestCartStore::load(Arc::new(FileGuestCartRepository::new(dir.path())));
    assert_eq!(store.count(), 4);
    assert_eq!(store.lines()[0].product, p);
  }
}
