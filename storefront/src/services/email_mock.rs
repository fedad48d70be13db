// storefront/src/services/email_mock.rs

//! Stand-in for a transactional email provider. Messages are logged and
//! dropped. A mailer built with `with_outbox` also keeps them in memory so
//! tests can read what was sent.

use crate::errors::{AppError, Result as AppResult};
use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SentEmailInfo {
  pub to: String,
  pub from: String,
  pub subject: String,
  pub body: String,
  pub message_id: String,
}

#[derive(Debug)]
pub struct MockMailer {
  sender: String,
  outbox: Option<Mutex<Vec<SentEmailInfo>>>,
}

impl MockMailer {
  pub fn new(sender: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      outbox: None,
    }
  }

  /// Keeps every sent message, sign-in codes included. Not for long-running servers.
  pub fn with_outbox(sender: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      outbox: Some(Mutex::new(Vec::new())),
    }
  }

  /// Recipients on the reserved `.invalid` TLD are rejected, which lets tests
  /// exercise delivery failures.
  pub async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<SentEmailInfo> {
    info!(to, from = %self.sender, subject, "Simulating email delivery.");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    if to.ends_with(".invalid") {
      warn!(to, "Simulated email bounce.");
      return Err(AppError::Email(format!("Recipient {} rejected the message", to)));
    }

    let sent = SentEmailInfo {
      to: to.to_string(),
      from: self.sender.clone(),
      subject: subject.to_string(),
      body: body.to_string(),
      message_id: format!("mock_email_{}", uuid::Uuid::new_v4()),
    };
    info!(message_id = %sent.message_id, "Mock email sent.");
    if let Some(outbox) = &self.outbox {
      outbox.lock().push(sent.clone());
    }
    Ok(sent)
  }

  /// Messages delivered to `to`, oldest first. Always empty without an outbox.
  pub fn sent_to(&self, to: &str) -> Vec<SentEmailInfo> {
    self.outbox.as_ref().map_or_else(Vec::new, |outbox| {
      outbox.lock().iter().filter(|m| m.to == to).cloned().collect()
    })
  }
}
