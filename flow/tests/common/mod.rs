// tests/common/mod.rs
#![allow(dead_code)]

use flow::{ContextData, FlowError, PipelineControl};
use once_cell::sync::Lazy;
use tracing::Level;

/// A small order-draft context: steps append lines and record that they ran.
#[derive(Clone, Debug, Default)]
pub struct DraftContext {
  pub lines: Vec<(String, i32)>,
  pub total_units: i32,
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Handler that records `step_name`, appends `(sku, qty)` and honours `stop_at`.
pub fn add_line_handler(step_name: &'static str, sku: &'static str, qty: i32) -> flow::Handler<DraftContext, TestError> {
  Box::new(move |ctx: ContextData<DraftContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.lines.push((sku.to_string(), qty));
      guard.total_units += qty;
      guard.steps_executed.push(step_name.to_string());
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> flow::Handler<DraftContext, TestError> {
  Box::new(move |ctx: ContextData<DraftContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Step(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
