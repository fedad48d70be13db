// tests/client_http_tests.rs
//
// Drives the client against a real listener so the reqwest adapter, the
// file-backed stores and the REST handlers are exercised together.

mod common;

use actix_web::{dev::ServerHandle, web, App, HttpServer};
use common::{product, setup_tracing, TestBackend};
use std::time::Duration;
use storefront::client::{CartError, CartSource, ClientConfig, StorefrontClient, TokenStore};
use storefront::models::Product;
use storefront::web::configure_app_routes;
use tempfile::TempDir;

const EMAIL: &str = "shopper@example.com";

struct Running {
  backend: TestBackend,
  handle: ServerHandle,
  config: ClientConfig,
  dir: TempDir,
}

async fn start(products: Vec<Product>) -> Running {
  setup_tracing();
  let backend = TestBackend::new(products);
  let state = backend.state.clone();
  let server = HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(state.clone()))
      .configure(configure_app_routes)
  })
  .workers(1)
  .bind(("127.0.0.1", 0))
  .unwrap();
  let addr = server.addrs()[0];
  let server = server.run();
  let handle = server.handle();
  actix_rt::spawn(server);

  let dir = tempfile::tempdir().unwrap();
  let config = ClientConfig {
    api_base_url: format!("http://{}/api/v1", addr),
    client_dir: dir.path().to_path_buf(),
    request_timeout: Duration::from_secs(5),
  };
  Running {
    backend,
    handle,
    config,
    dir,
  }
}

#[actix_web::test]
async fn guest_cart_follows_the_shopper_through_sign_in() {
  let boots = product("Boots", 10000, 20, 10);
  let socks = product("Socks", 500, 0, 50);
  let running = start(vec![boots.clone(), socks.clone()]).await;
  let client = StorefrontClient::from_config(&running.config).unwrap();

  let catalogue = client.api.list_products().await.unwrap();
  assert_eq!(catalogue.len(), 2);
  let boots_ref = client.api.product(boots.id).await.unwrap();
  assert_eq!(boots_ref.price_cents, 10000);
  let socks_ref = catalogue.iter().find(|p| p.id == socks.id).unwrap().clone();

  client.cart.add(&boots_ref, 3).await.unwrap();
  client.cart.add(&socks_ref, 2).await.unwrap();
  assert_eq!(client.cart.total(), 310.0);
  assert!(running.dir.path().join("guest_cart.json").exists());

  client.sign_in.request_code(EMAIL).await.unwrap();
  let code = running.backend.last_code_sent_to(EMAIL);
  let (login, report) = client.sign_in.verify(EMAIL, &code).await.unwrap();
  assert_eq!(login.email, EMAIL);
  assert_eq!(report.transferred, 2);
  assert_eq!(report.failed, 0);

  let snapshot = client.cart.snapshot();
  assert_eq!(snapshot.source, CartSource::Account);
  assert_eq!(snapshot.count, 5);
  assert_eq!(snapshot.total, 250.0);
  assert_eq!(running.backend.store.cart_rows(login.user_id).len(), 2);

  // A second client on the same directory picks up the session and the emptied guest cart.
  let restarted = StorefrontClient::from_config(&running.config).unwrap();
  let snapshot = restarted.cart.refresh().await;
  assert_eq!(snapshot.source, CartSource::Account);
  assert_eq!(snapshot.count, 5);

  client.sign_in.sign_out().await.unwrap();
  assert!(!running.dir.path().join("auth_token").exists());
  let snapshot = client.cart.snapshot();
  assert_eq!(snapshot.source, CartSource::Guest);
  assert!(snapshot.entries.is_empty());

  running.handle.stop(true).await;
}

#[actix_web::test]
async fn rejected_token_asks_for_sign_in() {
  let boots = product("Boots", 10000, 0, 10);
  let running = start(vec![boots.clone()]).await;
  let tokens = storefront::client::FileTokenStore::new(&running.config.client_dir);
  tokens.set_token("expired-or-forged").unwrap();
  let client = StorefrontClient::from_config(&running.config).unwrap();

  let boots_ref = client.api.product(boots.id).await.unwrap();
  let err = client.cart.add(&boots_ref, 1).await.unwrap_err();
  assert!(matches!(err, CartError::LoginRequired));

  let snapshot = client.cart.refresh().await;
  assert_eq!(snapshot.source, CartSource::Guest);

  running.handle.stop(true).await;
}
