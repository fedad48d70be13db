// storefront/src/client/merge.rs

//! Drains the guest cart into the account right after sign-in.
//!
//! Lines are transferred one at a time. A line that fails is logged and
//! counted, the loop moves on, and the guest cart is cleared regardless.
//! Nothing here is reported to the user as an error.

use crate::client::guest::{CartLine, GuestCartStore};
use crate::client::server::ServerCart;
use crate::models::CartView;
use flow::{ContextData, FlowError, Pipeline, PipelineControl, SkipCondition};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
  Idle,
  Draining,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
  pub attempted: usize,
  pub transferred: usize,
  pub failed: usize,
  pub failed_product_ids: Vec<Uuid>,
  /// The account cart as re-fetched after the drain, when that succeeded.
  pub server_cart: Option<CartView>,
}

pub struct MergeCtxData {
  guest: Arc<GuestCartStore>,
  server: Arc<dyn ServerCart>,
  lines: Vec<CartLine>,
  report: MergeReport,
}

fn no_guest_lines() -> SkipCondition<MergeCtxData> {
  Arc::new(|ctx: ContextData<MergeCtxData>| ctx.read().lines.is_empty())
}

fn build_merge_pipeline() -> Pipeline<MergeCtxData, FlowError> {
  let mut p = Pipeline::<MergeCtxData, FlowError>::new(&[
    ("collect_guest_lines", false, None),
    ("transfer_guest_lines", false, Some(no_guest_lines())),
    ("clear_guest_cart", false, Some(no_guest_lines())),
    ("refetch_server_cart", false, None),
  ])
  .with_name("guest_cart_merge");

  p.on_root("collect_guest_lines", |ctx: ContextData<MergeCtxData>| async move {
    let lines = ctx.read().guest.lines();
    debug!(lines = lines.len(), "Merge: guest lines collected.");
    let mut guard = ctx.write();
    guard.report.attempted = lines.len();
    guard.lines = lines;
    Ok::<_, FlowError>(PipelineControl::Continue)
  });

  p.on_root("transfer_guest_lines", |ctx: ContextData<MergeCtxData>| async move {
    let (lines, server) = {
      let guard = ctx.read();
      (guard.lines.clone(), guard.server.clone())
    };

    let mut transferred = 0;
    let mut failed = Vec::new();
    for line in &lines {
      match server.add(line.product.id, line.quantity).await {
        Ok(row) => {
          transferred += 1;
          debug!(product_id = %line.product.id, quantity = row.quantity, "Merge: line transferred.");
        }
        Err(e) => {
          warn!(product_id = %line.product.id, quantity = line.quantity, error = %e, "Merge: line not transferred.");
          failed.push(line.product.id);
        }
      }
    }

    let mut guard = ctx.write();
    guard.report.transferred = transferred;
    guard.report.failed = failed.len();
    guard.report.failed_product_ids = failed;
    Ok::<_, FlowError>(PipelineControl::Continue)
  });

  p.on_root("clear_guest_cart", |ctx: ContextData<MergeCtxData>| async move {
    let guest = ctx.read().guest.clone();
    if let Err(e) = guest.clear() {
      warn!(error = %e, "Merge: guest cart could not be cleared.");
    }
    Ok::<_, FlowError>(PipelineControl::Continue)
  });

  p.on_root("refetch_server_cart", |ctx: ContextData<MergeCtxData>| async move {
    let server = ctx.read().server.clone();
    match server.fetch().await {
      Ok(view) => {
        ctx.write().report.server_cart = Some(view);
      }
      Err(e) => warn!(error = %e, "Merge: account cart could not be re-fetched."),
    }
    Ok::<_, FlowError>(PipelineControl::Continue)
  });

  p
}

/// Puts the trigger back to `Idle` however the drain ends.
struct DrainGuard<'a>(&'a Mutex<MergeState>);

impl Drop for DrainGuard<'_> {
  fn drop(&mut self) {
    *self.0.lock() = MergeState::Idle;
  }
}

pub struct MergeTrigger {
  guest: Arc<GuestCartStore>,
  server: Arc<dyn ServerCart>,
  state: Mutex<MergeState>,
  pipeline: Pipeline<MergeCtxData, FlowError>,
}

impl MergeTrigger {
  pub fn new(guest: Arc<GuestCartStore>, server: Arc<dyn ServerCart>) -> Self {
    Self {
      guest,
      server,
      state: Mutex::new(MergeState::Idle),
      pipeline: build_merge_pipeline(),
    }
  }

  pub fn state(&self) -> MergeState {
    *self.state.lock()
  }

  /// Runs one drain. Returns `None` when a drain is already in progress.
  pub async fn trigger(&self) -> Option<MergeReport> {
    {
      let mut state = self.state.lock();
      if *state == MergeState::Draining {
        info!("Merge already in progress; trigger ignored.");
        return None;
      }
      *state = MergeState::Draining;
    }
    let _reset = DrainGuard(&self.state);

    let ctx = ContextData::new(MergeCtxData {
      guest: self.guest.clone(),
      server: self.server.clone(),
      lines: Vec::new(),
      report: MergeReport::default(),
    });
    if let Err(e) = self.pipeline.run(ctx.clone()).await {
      warn!(error = %e, "Merge pipeline ended early.");
    }

    let report = ctx.read().report.clone();
    info!(
      attempted = report.attempted,
      transferred = report.transferred,
      failed = report.failed,
      "Guest cart merged into account."
    );
    Some(report)
  }
}
