// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::CartView;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, MaybeUser};
use flow::{ContextData, PipelineResult};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
  pub product_id: Option<Uuid>,
  pub quantity: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCartItemRequest {
  pub quantity: i32,
}

/// Guests get an empty cart; their lines live client-side.
#[instrument(name = "handler::get_cart", skip_all)]
pub async fn get_cart_handler(app_state: web::Data<AppState>, user: MaybeUser) -> Result<HttpResponse, AppError> {
  let Some(user) = user.0 else {
    return Ok(HttpResponse::Ok().json(CartView::default()));
  };
  let rows = app_state.repos.carts.list_with_products(user.user_id).await?;
  let view = CartView::from_rows(rows);
  info!(user_id = %user.user_id, rows = view.items.len(), total = view.total, "Cart fetched.");
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::cart_count", skip_all)]
pub async fn cart_count_handler(app_state: web::Data<AppState>, user: MaybeUser) -> Result<HttpResponse, AppError> {
  let count = match user.0 {
    Some(user) => app_state.repos.carts.count(user.user_id).await?,
    None => 0,
  };
  Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, auth_user, req_payload),
  fields(user_id = %auth_user.user_id, product_id = ?req_payload.product_id, quantity = ?req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(AddToCartCtxData::new(
    app_state.get_ref().clone(),
    auth_user.user_id,
    payload.product_id,
    payload.quantity.unwrap_or(1),
  ));

  match app_state.flows.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => {
      let cart_item = ctx_data.read().cart_item.clone().ok_or_else(|| {
        warn!("Add to Cart completed without a cart row.");
        AppError::Internal("Cart update completed, but item details are unavailable.".to_string())
      })?;
      Ok(HttpResponse::Ok().json(json!({
        "message": "Item added to cart.",
        "cartItem": cart_item
      })))
    }
    Ok(PipelineResult::Stopped) => Err(AppError::Internal("Add to cart was halted.".to_string())),
    Err(app_err) => {
      warn!(error = %app_err, "Add to Cart failed.");
      Err(app_err)
    }
  }
}

/// Writes the quantity as given. Callers translate `quantity <= 0` into a delete.
#[instrument(name = "handler::update_cart_item", skip(app_state, auth_user, path, req_payload), fields(cart_id = %path.as_ref()))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
  let cart_id = path.into_inner();
  let quantity = req_payload.quantity;
  match app_state
    .repos
    .carts
    .update_quantity(auth_user.user_id, cart_id, quantity)
    .await?
  {
    Some(cart_item) => {
      info!(%cart_id, quantity, "Cart row updated.");
      Ok(HttpResponse::Ok().json(json!({
        "message": "Cart item updated.",
        "cartItem": cart_item
      })))
    }
    None => Err(AppError::NotFound(format!("Cart item {} not found.", cart_id))),
  }
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, auth_user, path), fields(cart_id = %path.as_ref()))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let cart_id = path.into_inner();
  if !app_state.repos.carts.remove(auth_user.user_id, cart_id).await? {
    return Err(AppError::NotFound(format!("Cart item {} not found.", cart_id)));
  }
  info!(%cart_id, "Cart row removed.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Item removed from cart." })))
}

#[instrument(name = "handler::clear_cart", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let removed = app_state.repos.carts.clear(auth_user.user_id).await?;
  info!(removed, "Cart cleared.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Cart cleared.", "removed": removed })))
}
