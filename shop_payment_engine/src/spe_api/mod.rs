//! # Shop payment engine public API
//!
//! * [`reconciliation_api`] merges provider-reported payment statuses into the ledger. It is the only write path for
//!   transaction status, payment records and stock.
//! * [`ledger_api`] records new transactions at checkout and answers queries over transactions, payments and
//!   products.
//!
//! Both APIs are created by supplying a backend that implements the traits they need:
//!
//! ```rust,ignore
//! use shop_payment_engine::{events::EventProducers, ReconciliationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/shop.db", 25).await?;
//! let api = ReconciliationApi::new(db, EventProducers::default());
//! let outcome = api.reconcile(&order_id, &status, StatusSource::Webhook).await?;
//! ```
pub mod ledger_api;
pub mod reconcile_objects;
pub mod reconciliation_api;
