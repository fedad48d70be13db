// tests/client_cart_tests.rs

mod common;

use common::{product, product_ref, setup_tracing, RepoServerCart};
use std::sync::Arc;
use std::time::Duration;
use storefront::client::{
  CartFacade, CartSource, GuestCartStore, IdentityResolver, MemoryGuestCartRepository, MemoryTokenStore, MergeReport,
  MergeState, ServerCart, TokenStore,
};
use storefront::models::Product;
use storefront::repo::MemoryStore;
use uuid::Uuid;

struct Harness {
  tokens: Arc<MemoryTokenStore>,
  guest: Arc<GuestCartStore>,
  server: Arc<RepoServerCart>,
  store: Arc<MemoryStore>,
  user_id: Uuid,
  facade: CartFacade,
}

fn harness(products: Vec<Product>) -> Harness {
  harness_with(products, |server| server)
}

fn harness_with(products: Vec<Product>, configure: impl FnOnce(RepoServerCart) -> RepoServerCart) -> Harness {
  setup_tracing();
  let store = Arc::new(MemoryStore::with_products(products));
  let user_id = Uuid::new_v4();
  let server = Arc::new(configure(RepoServerCart::new(store.clone(), user_id)));
  let tokens = Arc::new(MemoryTokenStore::new());
  let guest = Arc::new(GuestCartStore::load(Arc::new(MemoryGuestCartRepository::new())));
  let facade = CartFacade::new(IdentityResolver::new(tokens.clone()), guest.clone(), server.clone());
  Harness {
    tokens,
    guest,
    server,
    store,
    user_id,
    facade,
  }
}

#[tokio::test]
async fn guest_add_of_same_product_increments_one_line() {
  let kettle = product("Kettle", 4500, 0, 10);
  let h = harness(vec![kettle.clone()]);

  h.facade.add(&product_ref(&kettle), 1).await.unwrap();
  let snapshot = h.facade.add(&product_ref(&kettle), 1).await.unwrap();

  assert_eq!(snapshot.source, CartSource::Guest);
  assert_eq!(snapshot.entries.len(), 1);
  assert_eq!(snapshot.entries[0].quantity, 2);
  assert_eq!(snapshot.entries[0].line_id, kettle.id);
}

#[tokio::test]
async fn non_positive_update_removes_the_guest_line() {
  let kettle = product("Kettle", 4500, 0, 10);
  let mug = product("Mug", 900, 0, 10);
  let h = harness(vec![kettle.clone(), mug.clone()]);
  h.facade.add(&product_ref(&kettle), 2).await.unwrap();
  h.facade.add(&product_ref(&mug), 1).await.unwrap();

  let snapshot = h.facade.update(kettle.id, 0).await.unwrap();
  assert_eq!(snapshot.entries.len(), 1);
  let snapshot = h.facade.update(mug.id, -1).await.unwrap();
  assert!(snapshot.entries.is_empty());
  assert!(h.guest.is_empty());
}

#[tokio::test]
async fn non_positive_update_removes_the_account_row() {
  let kettle = product("Kettle", 4500, 0, 10);
  let mug = product("Mug", 900, 0, 10);
  let h = harness(vec![kettle.clone(), mug.clone()]);
  h.tokens.set_token("session-token").unwrap();

  h.facade.add(&product_ref(&kettle), 2).await.unwrap();
  let snapshot = h.facade.add(&product_ref(&mug), 1).await.unwrap();
  assert_eq!(snapshot.source, CartSource::Account);
  let kettle_row = snapshot.entries.iter().find(|e| e.product.id == kettle.id).unwrap().line_id;
  let mug_row = snapshot.entries.iter().find(|e| e.product.id == mug.id).unwrap().line_id;

  h.facade.update(kettle_row, 0).await.unwrap();
  let snapshot = h.facade.update(mug_row, -1).await.unwrap();

  assert!(snapshot.entries.is_empty());
  assert!(h.store.cart_rows(h.user_id).is_empty());
}

#[tokio::test]
async fn login_drains_every_guest_line_into_the_account() {
  let items: Vec<Product> = (0..3).map(|i| product(&format!("Item {}", i), 1000, 0, 10)).collect();
  let h = harness(items.clone());
  for (qty, item) in (1..).zip(&items) {
    h.facade.add(&product_ref(item), qty).await.unwrap();
  }

  let report = h.facade.on_login("session-token").await.unwrap();

  assert_eq!(report.attempted, 3);
  assert_eq!(report.transferred, 3);
  assert_eq!(report.failed, 0);
  assert!(h.guest.is_empty());

  let rows = h.store.cart_rows(h.user_id);
  assert_eq!(rows.len(), 3);
  for (qty, item) in (1..).zip(&items) {
    let row = rows.iter().find(|r| r.product_id == item.id).unwrap();
    assert_eq!(row.quantity, qty);
  }

  let snapshot = h.facade.snapshot();
  assert_eq!(snapshot.source, CartSource::Account);
  assert_eq!(snapshot.count, 6);
  assert_eq!(h.merge_state(), MergeState::Idle);
}

#[tokio::test]
async fn merge_adds_onto_existing_account_rows() {
  let kettle = product("Kettle", 4500, 0, 10);
  let h = harness(vec![kettle.clone()]);
  h.server.add(kettle.id, 1).await.unwrap();
  h.facade.add(&product_ref(&kettle), 2).await.unwrap();

  h.facade.on_login("session-token").await.unwrap();

  let rows = h.store.cart_rows(h.user_id);
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].quantity, 3);
}

#[tokio::test]
async fn failed_line_is_dropped_and_the_rest_still_merge() {
  let items: Vec<Product> = (0..3).map(|i| product(&format!("Item {}", i), 1000, 0, 10)).collect();
  let h = harness(items.clone());
  for item in &items {
    h.facade.add(&product_ref(item), 1).await.unwrap();
  }
  h.server.fail_adds_for(items[1].id);

  let report = h.facade.on_login("session-token").await.unwrap();

  assert_eq!(report.attempted, 3);
  assert_eq!(report.transferred, 2);
  assert_eq!(report.failed, 1);
  assert_eq!(report.failed_product_ids, vec![items[1].id]);
  assert_eq!(h.server.add_calls.lock().len(), 3);
  assert!(h.guest.is_empty());

  let rows = h.store.cart_rows(h.user_id);
  assert_eq!(rows.len(), 2);
  assert!(rows.iter().all(|r| r.product_id != items[1].id));
}

#[tokio::test]
async fn discount_applies_to_account_totals_only() {
  let boots = product("Boots", 10000, 20, 10);
  let h = harness(vec![boots.clone()]);

  let guest = h.facade.add(&product_ref(&boots), 3).await.unwrap();
  assert_eq!(guest.total, 300.0);

  h.facade.on_login("session-token").await.unwrap();
  let account = h.facade.refresh().await;
  assert_eq!(account.source, CartSource::Account);
  assert_eq!(account.total, 240.0);
  assert_eq!(h.facade.total(), 240.0);
}

#[tokio::test]
async fn count_is_the_sum_of_quantities_on_both_paths() {
  let kettle = product("Kettle", 4500, 0, 10);
  let mug = product("Mug", 900, 0, 10);
  let h = harness(vec![kettle.clone(), mug.clone()]);

  h.facade.add(&product_ref(&kettle), 2).await.unwrap();
  h.facade.add(&product_ref(&mug), 3).await.unwrap();
  assert_eq!(h.facade.count(), 5);

  h.facade.on_login("session-token").await.unwrap();
  assert_eq!(h.facade.count(), 5);
  assert_eq!(h.server.count().await.unwrap(), 5);
}

#[tokio::test]
async fn second_trigger_during_a_drain_is_ignored() {
  let kettle = product("Kettle", 4500, 0, 10);
  let h = harness_with(vec![kettle.clone()], |s| s.with_delay(Duration::from_millis(50)));
  h.facade.add(&product_ref(&kettle), 1).await.unwrap();
  h.tokens.set_token("session-token").unwrap();

  let merge = h.facade.merge_trigger();
  let (first, second) = tokio::join!(merge.trigger(), merge.trigger());

  assert!(first.is_some());
  assert!(second.is_none());
  assert_eq!(h.server.add_calls.lock().len(), 1);
  assert_eq!(merge.state(), MergeState::Idle);
}

#[tokio::test]
async fn login_during_a_running_drain_still_shows_the_account_cart() {
  let kettle = product("Kettle", 4500, 0, 10);
  let mug = product("Mug", 900, 0, 10);
  let h = harness_with(vec![kettle.clone(), mug.clone()], |s| s.with_delay(Duration::from_millis(50)));
  h.server.add(mug.id, 2).await.unwrap();
  h.facade.add(&product_ref(&kettle), 1).await.unwrap();
  assert_eq!(h.facade.snapshot().source, CartSource::Guest);

  let merge = h.facade.merge_trigger();
  let (running, login) = tokio::join!(merge.trigger(), h.facade.on_login("session-token"));

  assert!(running.is_some());
  assert_eq!(login.unwrap(), MergeReport::default());
  let snapshot = h.facade.snapshot();
  assert_eq!(snapshot.source, CartSource::Account);
  assert!(snapshot.entries.iter().any(|e| e.product.id == mug.id));
}

#[tokio::test]
async fn logout_switches_back_to_the_guest_cart() {
  let kettle = product("Kettle", 4500, 0, 10);
  let h = harness(vec![kettle.clone()]);
  h.facade.on_login("session-token").await.unwrap();
  h.facade.add(&product_ref(&kettle), 1).await.unwrap();

  let snapshot = h.facade.on_logout().await.unwrap();
  assert_eq!(snapshot.source, CartSource::Guest);
  assert!(snapshot.entries.is_empty());
  assert!(h.tokens.token().is_none());
  assert_eq!(h.store.cart_rows(h.user_id).len(), 1);
}

#[tokio::test]
async fn every_change_is_broadcast() {
  let kettle = product("Kettle", 4500, 0, 10);
  let h = harness(vec![kettle.clone()]);
  let mut rx = h.facade.subscribe();

  h.facade.add(&product_ref(&kettle), 1).await.unwrap();
  assert_eq!(rx.try_recv().unwrap().source, CartSource::Guest);

  h.facade.on_login("session-token").await.unwrap();
  let mut last = None;
  while let Ok(event) = rx.try_recv() {
    last = Some(event.source);
  }
  assert_eq!(last, Some(CartSource::Account));
}

impl Harness {
  fn merge_state(&self) -> MergeState {
    self.facade.merge_trigger().state()
  }
}
