// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  pub mock_email_sender: String,

  /// Lifetime of an emailed login code.
  pub otp_ttl_secs: i64,
  /// Wrong guesses allowed before a code is locked.
  pub otp_max_attempts: i32,
  pub session_ttl_hours: i64,

  pub run_migrations: bool,
  pub seed_db: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = parse_or_default("SERVER_PORT", "8080")?;
    let database_url = get_env("DATABASE_URL")?;
    let mock_email_sender = get_env("MOCK_EMAIL_SENDER").unwrap_or_else(|_| "noreply@example.com".to_string());

    let otp_ttl_secs = parse_or_default("OTP_TTL_SECS", "600")?;
    let otp_max_attempts = parse_or_default("OTP_MAX_ATTEMPTS", "5")?;
    let session_ttl_hours = parse_or_default("SESSION_TTL_HOURS", "168")?;
    let run_migrations = parse_or_default("RUN_MIGRATIONS", "true")?;
    let seed_db = parse_or_default("SEED_DB", "false")?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      mock_email_sender,
      otp_ttl_secs,
      otp_max_attempts,
      session_ttl_hours,
      run_migrations,
      seed_db,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

impl Default for AppConfig {
  /// Local settings with no database; used by the in-memory wiring and tests.
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: String::new(),
      mock_email_sender: "noreply@example.com".to_string(),
      otp_ttl_secs: 600,
      otp_max_attempts: 5,
      session_ttl_hours: 168,
      run_migrations: false,
      seed_db: false,
    }
  }
}

fn parse_or_default<T>(var_name: &str, default: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  env::var(var_name)
    .unwrap_or_else(|_| default.to_string())
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
}
