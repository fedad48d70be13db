// storefront/src/lib.rs

//! Storefront backend and the client-side cart that talks to it.
//!
//! The server half (`web`, `pipelines`, `repo`) owns authenticated carts,
//! email one-time-code login and order placement. The `client` half keeps a
//! guest cart locally, routes every cart operation to the right store and
//! drains the guest cart into the account on login.

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod pricing;
pub mod repo;
pub mod services;
pub mod state;
pub mod web;
