// storefront/src/services/auth_service.rs

//! One-time login codes and session tokens.

use crate::errors::AppError;
use argon2::{
  password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use rand_core::{OsRng, RngCore};
use std::fmt::Write as _;
use tracing::{debug, error, instrument};

pub const OTP_DIGITS: usize = 6;

/// Lower-cases and trims an email address, rejecting anything without a local
/// part and a dotted domain.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
  let email = raw.trim().to_lowercase();
  let valid = match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    }
    None => false,
  };
  if !valid {
    return Err(AppError::Validation("A valid email address is required.".to_string()));
  }
  Ok(email)
}

/// A uniformly distributed zero-padded six digit code.
pub fn generate_otp_code() -> String {
  // Rejection sampling keeps the distribution flat over 0..1_000_000.
  let limit = u32::MAX - (u32::MAX % 1_000_000);
  loop {
    let n = OsRng.next_u32();
    if n < limit {
      return format!("{:0width$}", n % 1_000_000, width = OTP_DIGITS);
    }
  }
}

pub fn is_well_formed_code(code: &str) -> bool {
  code.len() == OTP_DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}

#[instrument(name = "auth_service::hash_otp_code", skip(code), err(Display))]
pub fn hash_otp_code(code: &str) -> Result<String, AppError> {
  if code.is_empty() {
    return Err(AppError::Validation("Code cannot be empty.".to_string()));
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(code.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| {
      error!(error = %e, "Argon2 hashing failed.");
      AppError::Internal(format!("Code hashing failed: {}", e))
    })
}

#[instrument(name = "auth_service::verify_otp_code", skip_all, err(Display))]
pub fn verify_otp_code(stored_hash: &str, provided: &str) -> Result<bool, AppError> {
  let parsed = PasswordHash::new(stored_hash).map_err(|e| {
    error!(error = %e, "Stored code hash is malformed.");
    AppError::Internal(format!("Invalid stored code hash: {}", e))
  })?;

  match Argon2::default().verify_password(provided.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Code did not match.");
      Ok(false)
    }
    Err(e) => {
      error!(error = %e, "Argon2 verification failed.");
      Err(AppError::Internal(format!("Code verification failed: {}", e)))
    }
  }
}

/// An opaque 256-bit bearer token, hex encoded.
pub fn generate_session_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  bytes.iter().fold(String::with_capacity(64), |mut out, b| {
    let _ = write!(out, "{:02x}", b);
    out
  })
}
