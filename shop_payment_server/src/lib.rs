//! # Shop payment gateway server
//! This crate hosts the HTTP server for the shop payment gateway. It is responsible for:
//! * Receiving payment notifications from Midtrans and handing them to the reconciliation engine.
//! * Letting operators force a payment status, or pull the current status from Midtrans when a notification was
//!   missed.
//! * Checkout, and read-only views over transactions, payments and earnings.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/payment/webhook`: The Midtrans notification endpoint. It does not require a bearer token, and always
//!   answers 200.
//! * `/api/...`: Everything else requires an HS256 bearer token. See [routes] for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
