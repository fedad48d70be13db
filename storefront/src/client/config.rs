// storefront/src/client/config.rs

use crate::client::errors::{ClientError, ClientResult};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base of the REST API, including the version prefix.
  pub api_base_url: String,
  /// Where the guest cart and the session token are persisted.
  pub client_dir: PathBuf,
  pub request_timeout: Duration,
}

impl ClientConfig {
  pub fn from_env() -> ClientResult<Self> {
    dotenv().ok();
    let defaults = Self::default();

    let api_base_url = env::var("STOREFRONT_API_URL")
      .map(|url| url.trim_end_matches('/').to_string())
      .unwrap_or(defaults.api_base_url);
    let client_dir = env::var("STOREFRONT_CLIENT_DIR")
      .map(PathBuf::from)
      .unwrap_or(defaults.client_dir);
    let request_timeout = match env::var("STOREFRONT_TIMEOUT_SECS") {
      Ok(raw) => Duration::from_secs(
        raw
          .parse::<u64>()
          .map_err(|e| ClientError::Validation(format!("Invalid STOREFRONT_TIMEOUT_SECS: {}", e)))?,
      ),
      Err(_) => defaults.request_timeout,
    };

    Ok(Self {
      api_base_url,
      client_dir,
      request_timeout,
    })
  }
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      api_base_url: "http://127.0.0.1:8080/api/v1".to_string(),
      client_dir: PathBuf::from(".storefront"),
      request_timeout: Duration::from_secs(10),
    }
  }
}
