// storefront/src/client/identity.rs

//! Decides, per cart operation, whether the actor is a guest or signed in.
//!
//! A stored non-empty token counts as signed in. The token is not checked for
//! expiry here; an expired token surfaces later as `ClientError::Unauthorized`
//! from the server.

use crate::client::errors::{ClientError, ClientResult};
use parking_lot::RwLock;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub trait TokenStore: Send + Sync {
  fn token(&self) -> Option<String>;
  fn set_token(&self, token: &str) -> ClientResult<()>;
  fn clear(&self) -> ClientResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
  token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl TokenStore for MemoryTokenStore {
  fn token(&self) -> Option<String> {
    self.token.read().clone()
  }

  fn set_token(&self, token: &str) -> ClientResult<()> {
    *self.token.write() = Some(token.to_string());
    Ok(())
  }

  fn clear(&self) -> ClientResult<()> {
    *self.token.write() = None;
    Ok(())
  }
}

/// Keeps the token in `<dir>/auth_token`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
  path: PathBuf,
}

impl FileTokenStore {
  pub const FILE_NAME: &'static str = "auth_token";

  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      path: dir.into().join(Self::FILE_NAME),
    }
  }
}

impl TokenStore for FileTokenStore {
  fn token(&self) -> Option<String> {
    match fs::read_to_string(&self.path) {
      Ok(raw) => Some(raw.trim().to_string()),
      Err(e) if e.kind() == ErrorKind::NotFound => None,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "Could not read stored token.");
        None
      }
    }
  }

  fn set_token(&self, token: &str) -> ClientResult<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(&self.path, token)?;
    Ok(())
  }

  fn clear(&self) -> ClientResult<()> {
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(ClientError::from(e)),
    }
  }
}

#[derive(Clone)]
pub struct IdentityResolver {
  store: Arc<dyn TokenStore>,
}

impl IdentityResolver {
  pub fn new(store: Arc<dyn TokenStore>) -> Self {
    Self { store }
  }

  pub fn is_authenticated(&self) -> bool {
    let authenticated = self.token().is_some();
    debug!(authenticated, "Resolved cart identity.");
    authenticated
  }

  /// The stored token, if it is non-empty.
  pub fn token(&self) -> Option<String> {
    self.store.token().filter(|t| !t.trim().is_empty())
  }

  pub fn remember(&self, token: &str) -> ClientResult<()> {
    if token.trim().is_empty() {
      return Err(ClientError::Validation("Refusing to store an empty token.".to_string()));
    }
    self.store.set_token(token)
  }

  pub fn forget(&self) -> ClientResult<()> {
    self.store.clear()
  }
}
