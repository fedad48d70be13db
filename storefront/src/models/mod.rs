// storefront/src/models/mod.rs

//! Database rows and the API shapes built from them.

pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod otp;
pub mod product;
pub mod session;
pub mod user;

pub use cart_item::{CartItem, CartItemView, CartView};
pub use order::{Order, OrderStatus};
pub use order_item::OrderItem;
pub use otp::OtpChallenge;
pub use product::{Product, ProductSummary};
pub use session::Session;
pub use user::User;
