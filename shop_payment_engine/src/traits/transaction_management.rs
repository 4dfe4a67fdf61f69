use thiserror::Error;

use crate::{
    db_types::{NewTransaction, OrderId, Payment, PaymentEvent, Transaction},
    traits::data_objects::{EarningsSummary, PaymentQueryFilter, TransactionQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
    #[error("A transaction for order {0} already exists")]
    DuplicateOrder(OrderId),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Insufficient stock for product {product_id}. Available: {available}, Requested: {requested}")]
    InsufficientStock { product_id: i64, available: i64, requested: i64 },
    #[error("Quantity must be at least 1, but was {0}")]
    InvalidQuantity(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The `TransactionManagement` trait covers the Transaction Ledger and the read side of the Payment Record Store.
///
/// Transaction status and payment records are never written through this trait. That is the job of
/// [`crate::traits::ReconciliationDatabase`].
#[allow(async_fn_in_trait)]
pub trait TransactionManagement {
    /// Records a new pending transaction at checkout.
    ///
    /// The transaction is rejected if the order id is already taken, or if it references a product that does not exist
    /// or does not have enough stock for the requested quantity. Stock is *not* reserved here; it is only taken when
    /// the transaction is first settled.
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, LedgerError>;

    async fn fetch_transaction(&self, order_id: &OrderId) -> Result<Option<Transaction>, LedgerError>;

    /// Fetches transactions matching the filter, newest first.
    async fn fetch_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, LedgerError>;

    /// The latest provider-reported state for the order, if any status has been reported yet.
    async fn fetch_payment(&self, order_id: &OrderId) -> Result<Option<Payment>, LedgerError>;

    async fn fetch_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, LedgerError>;

    /// Every distinct status report received for the order, oldest first.
    async fn fetch_payment_events(&self, order_id: &OrderId) -> Result<Vec<PaymentEvent>, LedgerError>;

    async fn earnings(&self) -> Result<EarningsSummary, LedgerError>;
}
