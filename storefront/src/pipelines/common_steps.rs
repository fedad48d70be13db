// storefront/src/pipelines/common_steps.rs

//! Email steps shared by the login and order pipelines.

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::{OtpRequestCtxData, PlaceOrderCtxData};
use crate::pricing;
use flow::{ContextData, PipelineControl};
use tracing::{info, instrument, warn};

#[instrument(name = "common_step::send_login_code", skip(ctx_data), err)]
pub async fn send_login_code_email_step(ctx_data: ContextData<OtpRequestCtxData>) -> AppResult<PipelineControl> {
  let (email, code, ttl_secs, mailer) = {
    let guard = ctx_data.read();
    (
      guard.email.clone(),
      guard.code.clone(),
      guard.app_state.config.otp_ttl_secs,
      guard.app_state.mailer.clone(),
    )
  };
  let (Some(email), Some(code)) = (email, code) else {
    return Err(AppError::Internal("Login code missing from context.".to_string()));
  };

  let sent = mailer
    .send(
      &email,
      "Your sign-in code",
      &format!(
        "<p>Your sign-in code is <strong>{}</strong>.</p><p>It expires in {} minutes.</p>",
        code,
        ttl_secs / 60
      ),
    )
    .await?;
  info!(%email, message_id = %sent.message_id, "Login code sent.");
  ctx_data.write().message_id = Some(sent.message_id);
  Ok(PipelineControl::Continue)
}

/// Failures are logged and the order stands.
#[instrument(name = "common_step::send_order_confirmation", skip(ctx_data), err)]
pub async fn send_order_confirmation_email_step(ctx_data: ContextData<PlaceOrderCtxData>) -> AppResult<PipelineControl> {
  let (user_id, order, app_state) = {
    let guard = ctx_data.read();
    (guard.user_id, guard.order.clone(), guard.app_state.clone())
  };
  let Some(order) = order else {
    return Err(AppError::Internal("Order missing from context.".to_string()));
  };

  let user = match app_state.repos.users.find_by_id(user_id).await {
    Ok(Some(user)) => user,
    Ok(None) => {
      warn!(%user_id, order_id = %order.id, "No account found for order confirmation.");
      return Ok(PipelineControl::Continue);
    }
    Err(e) => {
      warn!(%user_id, order_id = %order.id, error = %e, "Could not load account for order confirmation.");
      return Ok(PipelineControl::Continue);
    }
  };

  let total_display = format!(
    "{:.2} {}",
    pricing::cents_to_units(order.total_cents as f64),
    order.currency
  );
  match app_state
    .mailer
    .send(
      &user.email,
      &format!("Your order #{} is confirmed", order.id),
      &format!(
        "<p>Your order #{} for {} has been placed.</p><p>Thank you for your purchase!</p>",
        order.id, total_display
      ),
    )
    .await
  {
    Ok(sent) => {
      info!(order_id = %order.id, message_id = %sent.message_id, "Order confirmation sent.");
      ctx_data.write().confirmation_message_id = Some(sent.message_id);
    }
    Err(e) => {
      warn!(order_id = %order.id, error = %e, "Failed to send order confirmation.");
    }
  }
  Ok(PipelineControl::Continue)
}
