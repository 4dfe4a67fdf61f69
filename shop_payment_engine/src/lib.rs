//! Shop Payment Engine
//!
//! The shop payment engine keeps an online shop's transaction ledger, payment records and inventory consistent with
//! what the payment provider reports. It is provider-agnostic: provider adapters normalize their payloads into a
//! [`db_types::ProviderStatus`] and hand it to the engine.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. The data types stored in the database are defined in [`db_types`] and are public.
//! 2. The payment engine public API ([`mod@spe_api`]). [`ReconciliationApi`] is the only write path for payment
//!    statuses, and [`LedgerApi`] covers checkout and queries. Backends implement the contracts in [`traits`].
//!
//! The engine also emits events after a reconciliation commits, e.g. when a transaction is paid for the first time.
//! Subscribe to them with [`events::EventHooks`].
mod db;

pub mod db_types;
pub mod events;
mod spe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use spe_api::{
    ledger_api::LedgerApi,
    reconcile_objects::{ReconcileOutcome, ReconcileResult, ReconcileWarning, TransitionPlan},
    reconciliation_api::ReconciliationApi,
};
