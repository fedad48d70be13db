// storefront/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_add_to_cart_pipeline(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(&[
    ("validate_cart_input", false, None),
    ("fetch_product_for_cart", false, None),
    ("check_product_stock_for_cart", false, None),
    ("upsert_cart_item", false, None),
  ])
  .with_name("add_to_cart");

  p.on_root("validate_cart_input", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (product_id, quantity) = {
      let guard = ctx_data.read();
      (guard.product_id, guard.quantity)
    };

    if product_id.is_none() {
      warn!("Add to Cart: request without a product id.");
      return Err(AppError::Validation("productId is required.".to_string()));
    }
    if quantity <= 0 {
      warn!(quantity, "Add to Cart: non-positive quantity.");
      return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_root("fetch_product_for_cart", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (product_id, products) = {
      let guard = ctx_data.read();
      (guard.product_id, guard.app_state.repos.products.clone())
    };
    let product_id = product_id.ok_or_else(|| AppError::Validation("productId is required.".to_string()))?;

    match products.find(product_id).await? {
      Some(product) => {
        info!(%product_id, price_cents = product.price_cents, stock = product.stock_quantity, "Add to Cart: product found.");
        ctx_data.write().product = Some(product);
        Ok(PipelineControl::Continue)
      }
      None => {
        warn!(%product_id, "Add to Cart: product not found.");
        Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
      }
    }
  });

  p.on_root("check_product_stock_for_cart", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (user_id, requested, product, carts) = {
      let guard = ctx_data.read();
      (
        guard.user_id,
        guard.quantity,
        guard.product.clone(),
        guard.app_state.repos.carts.clone(),
      )
    };
    let Some(product) = product else {
      return Err(AppError::Internal("Product missing from add-to-cart context.".to_string()));
    };

    // The row ends up at existing + requested, so that is what stock must cover.
    let in_cart = carts
      .find_by_product(user_id, product.id)
      .await?
      .map_or(0, |row| row.quantity.max(0));
    let wanted = i64::from(in_cart) + i64::from(requested);
    if i64::from(product.stock_quantity) < wanted {
      warn!(
        product_id = %product.id,
        available = product.stock_quantity,
        in_cart,
        requested,
        "Add to Cart: insufficient stock."
      );
      return Err(AppError::Validation(format!(
        "Insufficient stock. Only {} available.",
        product.stock_quantity
      )));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_root("upsert_cart_item", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (user_id, product_id, quantity, carts) = {
      let guard = ctx_data.read();
      (guard.user_id, guard.product_id, guard.quantity, guard.app_state.repos.carts.clone())
    };
    let product_id = product_id.ok_or_else(|| AppError::Validation("productId is required.".to_string()))?;

    let row = carts.add_or_increment(user_id, product_id, quantity).await?;
    info!(%user_id, %product_id, cart_item_id = %row.id, quantity = row.quantity, "Add to Cart: row upserted.");
    ctx_data.write().cart_item = Some(row);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(p);
  info!("Add to Cart pipeline registered.");
}
