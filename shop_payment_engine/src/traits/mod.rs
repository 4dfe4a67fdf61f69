//! # Backend and collaborator contracts
//!
//! The payment engine is storage-agnostic. A backend must implement these traits in order to act as the ledger for the
//! shop payment gateway.
//!
//! * [`ReconciliationDatabase`] is the write path. It merges provider-reported payment statuses into the transaction
//!   ledger, the payment record store and the inventory ledger as one atomic unit.
//! * [`TransactionManagement`] records new transactions at checkout and provides queries over transactions and
//!   payments.
//! * [`InventoryManagement`] provides product seeding and lookups.
//!
//! [`PaymentProvider`] is not a storage contract. It describes the payment provider's status API, which the poll
//! trigger uses to pull a status the webhook may have missed.
mod inventory_management;
mod payment_provider;
mod reconciliation_database;
mod transaction_management;

mod data_objects;

pub use data_objects::{EarningsSummary, PaymentQueryFilter, TransactionQueryFilter, DEFAULT_PAGE_SIZE};
pub use inventory_management::InventoryManagement;
pub use payment_provider::{PaymentProvider, ProviderError};
pub use reconciliation_database::{ReconciliationDatabase, ReconciliationError};
pub use transaction_management::{LedgerError, TransactionManagement};
