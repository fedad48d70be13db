// storefront/src/web/routes.rs

use crate::web::handlers::{auth_handlers, cart_handlers, order_handlers, product_handlers};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/otp/request", web::post().to(auth_handlers::request_otp_handler))
          .route("/otp/verify", web::post().to(auth_handlers::verify_otp_handler))
          .route("/logout", web::post().to(auth_handlers::logout_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::post().to(cart_handlers::add_to_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/count", web::get().to(cart_handlers::cart_count_handler))
          .route("/{cart_id}", web::put().to(cart_handlers::update_cart_item_handler))
          .route("/{cart_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::place_order_handler)),
      ),
  );
}
