// storefront/src/pipelines/mod.rs

//! Defines and registers every pipeline the server runs.

use crate::errors::AppError;
use crate::state::AppState;
use flow::FlowRegistry;
use std::sync::Arc;

pub mod contexts;
pub mod common_steps;

pub mod cart_pipeline;
pub mod order_pipeline;
pub mod otp_pipeline;

/// Called once while `AppState` is being built.
pub fn register_all_pipelines(registry: &Arc<FlowRegistry<AppError>>, app_state: &AppState) {
  tracing::info!("Registering pipelines...");

  cart_pipeline::register_add_to_cart_pipeline(registry, app_state);
  otp_pipeline::register_otp_request_pipeline(registry, app_state);
  otp_pipeline::register_otp_verify_pipeline(registry, app_state);
  order_pipeline::register_place_order_pipeline(registry, app_state);

  tracing::info!("All pipelines registered.");
}
