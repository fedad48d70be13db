// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize, Debug, Default)]
pub struct ListProductsQuery {
  pub category: Option<String>,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let mut products = app_state.repos.products.list().await?;
  if let Some(category) = query.category.as_deref() {
    products.retain(|p| p.category.as_deref() == Some(category));
  }
  info!("Fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(json!({
    "message": "Products fetched successfully.",
    "products": products
  })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  match app_state.repos.products.find(product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(json!({
      "message": "Product fetched successfully.",
      "product": product
    }))),
    None => {
      warn!("Product with ID {} not found.", product_id);
      Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
    }
  }
}
