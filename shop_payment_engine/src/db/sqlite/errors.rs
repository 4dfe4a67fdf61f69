use thiserror::Error;

use crate::{
    db_types::OrderId,
    traits::{LedgerError, ReconciliationError},
};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database query error: {0}")]
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

impl From<SqliteDatabaseError> for LedgerError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DriverError(e) => LedgerError::DatabaseError(e.to_string()),
            SqliteDatabaseError::QueryError(s) => LedgerError::QueryError(s),
            SqliteDatabaseError::DuplicateOrder(id) => LedgerError::DuplicateOrder(id),
            SqliteDatabaseError::ProductNotFound(id) => LedgerError::ProductNotFound(id),
            SqliteDatabaseError::InsufficientStock { product_id, available, requested } => {
                LedgerError::InsufficientStock { product_id, available, requested }
            },
            SqliteDatabaseError::InvalidQuantity(q) => LedgerError::InvalidQuantity(q),
        }
    }
}

impl From<SqliteDatabaseError> for ReconciliationError {
    fn from(e: SqliteDatabaseError) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}
