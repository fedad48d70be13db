// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use flow::{ContextData, PipelineResult};

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Deserialize, Debug, Default)]
pub struct PlaceOrderRequest {
  pub currency: Option<String>,
}

#[instrument(name = "handler::place_order", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: Option<web::Json<PlaceOrderRequest>>,
) -> Result<HttpResponse, AppError> {
  let currency = req_payload
    .and_then(|p| p.into_inner().currency)
    .map(|c| c.trim().to_uppercase())
    .filter(|c| c.len() == 3)
    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
  let ctx_data = ContextData::new(PlaceOrderCtxData::new(
    app_state.get_ref().clone(),
    auth_user.user_id,
    currency,
  ));

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (order, items) = {
        let guard = ctx_data.read();
        (guard.order.clone(), guard.order_items.clone())
      };
      let order = order.ok_or_else(|| AppError::Internal("Order placement completed without an order.".to_string()))?;
      info!(order_id = %order.id, total_cents = order.total_cents, "Order placed.");
      Ok(HttpResponse::Created().json(json!({
        "message": "Order placed.",
        "order": order,
        "items": items
      })))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Order placement was halted.".to_string())),
  }
}

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.repos.orders.list_for_user(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}
