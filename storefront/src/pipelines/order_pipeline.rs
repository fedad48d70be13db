// storefront/src/pipelines/order_pipeline.rs

//! Turns the caller's server cart into an order. Lines are frozen at the
//! discounted unit price in effect at placement time, and the cart is cleared
//! in the same transaction that writes the order.

use crate::errors::AppError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::pricing;
use crate::repo::NewOrderLine;
use crate::state::AppState;
use flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_place_order_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(&[
    ("load_cart_for_order", false, None),
    ("ensure_cart_not_empty", false, None),
    ("price_order_lines", false, None),
    ("persist_order_and_clear_cart", false, None),
    ("send_order_confirmation", true, None),
  ])
  .with_name("place_order");

  p.on_root("load_cart_for_order", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let (user_id, carts) = {
      let guard = ctx_data.read();
      (guard.user_id, guard.app_state.repos.carts.clone())
    };
    let rows = carts.list_with_products(user_id).await?;
    info!(%user_id, rows = rows.len(), "Place Order: cart loaded.");
    ctx_data.write().cart_rows = rows;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("ensure_cart_not_empty", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let guard = ctx_data.read();
    let has_orderable_line = guard.cart_rows.iter().any(|(item, _)| item.quantity > 0);
    if !has_orderable_line {
      warn!(user_id = %guard.user_id, "Place Order: cart is empty.");
      return Err(AppError::Validation("Cart is empty.".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_root("price_order_lines", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let mut guard = ctx_data.write();
    // Rows left at a non-positive quantity by a direct overwrite are not ordered.
    let lines: Vec<NewOrderLine> = guard
      .cart_rows
      .iter()
      .filter(|(item, _)| item.quantity > 0)
      .map(|(item, product)| NewOrderLine {
        product_id: product.id,
        quantity: item.quantity,
        price_at_purchase_cents: pricing::order_unit_price_cents(product.price_cents, product.discount_percent),
      })
      .collect();
    guard.total_cents = lines
      .iter()
      .map(|l| l.price_at_purchase_cents * i64::from(l.quantity))
      .sum();
    guard.lines = lines;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("persist_order_and_clear_cart", |ctx_data: ContextData<PlaceOrderCtxData>| async move {
    let (user_id, lines, total_cents, currency, orders) = {
      let guard = ctx_data.read();
      (
        guard.user_id,
        guard.lines.clone(),
        guard.total_cents,
        guard.currency.clone(),
        guard.app_state.repos.orders.clone(),
      )
    };
    let (order, items) = orders.place_order(user_id, &lines, total_cents, &currency).await?;
    info!(%user_id, order_id = %order.id, total_cents, lines = items.len(), "Place Order: order persisted, cart cleared.");
    {
      let mut guard = ctx_data.write();
      guard.order = Some(order);
      guard.order_items = items;
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("send_order_confirmation", common_steps::send_order_confirmation_email_step);

  registry.register_pipeline(p);
  info!("Place Order pipeline registered.");
}
