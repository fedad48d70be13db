// storefront/src/models/otp.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A pending email login code. Only the argon2 hash of the code is stored.
#[derive(Debug, Clone, FromRow)]
pub struct OtpChallenge {
  pub email: String,
  pub code_hash: String,
  pub expires_at: DateTime<Utc>,
  pub attempts: i32,
  pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now >= self.expires_at
  }
}
