use serde::{Deserialize, Serialize};
use spg_common::Money;
use sqlx::FromRow;

use crate::db_types::TransactionStatus;

pub const DEFAULT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQueryFilter {
    pub customer_id: Option<i64>,
    pub statuses: Vec<TransactionStatus>,
    pub offset: i64,
    pub limit: i64,
}

impl Default for TransactionQueryFilter {
    fn default() -> Self {
        Self { customer_id: None, statuses: Vec::new(), offset: 0, limit: DEFAULT_PAGE_SIZE }
    }
}

impl TransactionQueryFilter {
    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_pagination(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset.max(0);
        self.limit = limit.max(0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() && self.statuses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentQueryFilter {
    /// Matches the raw provider status, e.g. `settlement`
    pub transaction_status: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl Default for PaymentQueryFilter {
    fn default() -> Self {
        Self { transaction_status: None, offset: 0, limit: DEFAULT_PAGE_SIZE }
    }
}

impl PaymentQueryFilter {
    pub fn with_transaction_status<S: Into<String>>(mut self, status: S) -> Self {
        self.transaction_status = Some(status.into());
        self
    }

    pub fn with_pagination(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset.max(0);
        self.limit = limit.max(0);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct EarningsSummary {
    /// Sum of `total_amount` over paid transactions
    pub total_earnings: Money,
    pub paid_count: i64,
    pub pending_count: i64,
    pub failed_count: i64,
}
