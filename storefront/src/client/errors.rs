// storefront/src/client/errors.rs

use thiserror::Error;

/// Failures talking to the API or to local storage.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("Not authorized: {0}")]
  Unauthorized(String),

  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Server responded {status}: {message}")]
  Server { status: u16, message: String },

  #[error("Could not decode response: {0}")]
  Decode(String),

  #[error("Local storage error: {0}")]
  Storage(String),
}

impl From<reqwest::Error> for ClientError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      ClientError::Decode(err.to_string())
    } else {
      ClientError::Transport(err.to_string())
    }
  }
}

impl From<std::io::Error> for ClientError {
  fn from(err: std::io::Error) -> Self {
    ClientError::Storage(err.to_string())
  }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// What an explicit cart action reports back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
  #[error("Please sign in to continue.")]
  LoginRequired,

  #[error("{0}")]
  Validation(String),

  #[error("Your cart could not be updated right now: {0}")]
  Unavailable(String),
}

impl From<ClientError> for CartError {
  fn from(err: ClientError) -> Self {
    match err {
      ClientError::Unauthorized(_) => CartError::LoginRequired,
      ClientError::Validation(message) => CartError::Validation(message),
      ClientError::Server { status, message } if (400..500).contains(&status) => CartError::Validation(message),
      other => CartError::Unavailable(other.to_string()),
    }
  }
}
