// storefront/src/client/mod.rs

//! Client-side cart: a guest cart on this device, the account cart over HTTP,
//! and the facade that routes between them.

pub mod config;
pub mod errors;
pub mod facade;
pub mod guest;
pub mod http;
pub mod identity;
pub mod merge;
pub mod product_ref;
pub mod server;
pub mod session;

pub use config::ClientConfig;
pub use errors::{CartError, ClientError, ClientResult};
pub use facade::{CartEntry, CartFacade, CartSnapshot};
pub use guest::{
  CartChanged, CartLine, CartSource, FileGuestCartRepository, GuestCartRepository, GuestCartStore,
  MemoryGuestCartRepository, GUEST_CART_KEY,
};
pub use http::ApiConnection;
pub use identity::{FileTokenStore, IdentityResolver, MemoryTokenStore, TokenStore};
pub use merge::{MergeReport, MergeState, MergeTrigger};
pub use product_ref::ProductRef;
pub use server::{HttpServerCart, ServerCart};
pub use session::{LoginResponse, SignIn, SignInError, StorefrontApi};

use std::sync::Arc;

/// A fully wired client: file-backed guest cart and token under
/// `config.client_dir`, HTTP access to the API.
pub struct StorefrontClient {
  pub cart: Arc<CartFacade>,
  pub sign_in: SignIn,
  pub api: StorefrontApi,
}

impl StorefrontClient {
  pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
    let identity = IdentityResolver::new(Arc::new(FileTokenStore::new(&config.client_dir)));
    let guest = Arc::new(GuestCartStore::load(Arc::new(FileGuestCartRepository::new(&config.client_dir))));
    let conn = ApiConnection::new(config, identity.clone())?;
    let api = StorefrontApi::new(conn.clone());
    let cart = Arc::new(CartFacade::new(identity, guest, Arc::new(HttpServerCart::new(conn))));
    Ok(Self {
      sign_in: SignIn::new(api.clone(), cart.clone()),
      cart,
      api,
    })
  }
}
