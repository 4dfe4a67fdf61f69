use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, OutcomeClass, TransactionStatus};

//--------------------------------------    ReconcileOutcome   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// No transaction exists for the order. Nothing was written.
    UnknownOrder { order_id: OrderId },
    Reconciled(ReconcileResult),
}

impl ReconcileOutcome {
    pub fn is_unknown_order(&self) -> bool {
        matches!(self, ReconcileOutcome::UnknownOrder { .. })
    }

    pub fn result(&self) -> Option<&ReconcileResult> {
        match self {
            ReconcileOutcome::Reconciled(r) => Some(r),
            ReconcileOutcome::UnknownOrder { .. } => None,
        }
    }
}

//--------------------------------------    ReconcileResult    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    /// The surrogate id of the reconciled transaction
    pub transaction_id: i64,
    pub order_id: OrderId,
    pub outcome: OutcomeClass,
    pub previous_status: TransactionStatus,
    pub new_status: TransactionStatus,
    /// True for exactly one call per order: the one that moved it into `paid` and took the stock.
    pub stock_decremented: bool,
    /// True if this exact notification had already been recorded in the payment event log.
    pub duplicate_event: bool,
    pub warnings: Vec<ReconcileWarning>,
}

impl ReconcileResult {
    /// The order transitioned into `paid` during this call.
    pub fn newly_paid(&self) -> bool {
        self.previous_status != TransactionStatus::Paid && self.new_status == TransactionStatus::Paid
    }
}

//--------------------------------------    ReconcileWarning   ---------------------------------------------------------
/// Business-level disagreements found while reconciling. None of these abort a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileWarning {
    /// The order was settled, but the product did not have enough stock left to cover it.
    StockExhausted { product_id: i64, available: i64, requested: i64 },
    /// The order was settled, but its product no longer exists.
    ProductMissing { product_id: i64 },
    /// A failure status arrived for an order that has already been paid. The order was left as `paid`.
    SettledOrderReportedFailed { status_code: String },
}

impl Display for ReconcileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileWarning::StockExhausted { product_id, available, requested } => {
                write!(f, "Insufficient stock for product {product_id}. Stock: {available}, Requested: {requested}")
            },
            ReconcileWarning::ProductMissing { product_id } => write!(f, "Product {product_id} does not exist"),
            ReconcileWarning::SettledOrderReportedFailed { status_code } => {
                write!(f, "Paid order was reported as '{status_code}'. Status left unchanged, review required")
            },
        }
    }
}

//--------------------------------------     TransitionPlan    ---------------------------------------------------------
/// What reconciliation must write for a given provider outcome, decided from the transaction status that was read
/// under the order lock.
///
/// | previous \ outcome | Settled                  | Failed                   | Indeterminate |
/// |--------------------|--------------------------|--------------------------|---------------|
/// | pending            | paid, take stock         | failed                   | -             |
/// | failed             | paid, take stock         | failed                   | -             |
/// | cancelled          | paid, take stock         | failed                   | -             |
/// | paid               | paid                     | - (flagged for review)   | -             |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// The status to write, if any. Settlements always rewrite `paid` so that the provider transaction id is recorded.
    pub write_status: Option<TransactionStatus>,
    pub decrement_stock: bool,
    pub warning: Option<ReconcileWarning>,
}

impl TransitionPlan {
    pub fn new(previous: TransactionStatus, outcome: OutcomeClass, status_code: &str) -> Self {
        use TransactionStatus::*;
        match (outcome, previous) {
            (OutcomeClass::Settled, Paid) => Self { write_status: Some(Paid), decrement_stock: false, warning: None },
            (OutcomeClass::Settled, _) => Self { write_status: Some(Paid), decrement_stock: true, warning: None },
            (OutcomeClass::Failed, Paid) => Self {
                write_status: None,
                decrement_stock: false,
                warning: Some(ReconcileWarning::SettledOrderReportedFailed { status_code: status_code.to_string() }),
            },
            (OutcomeClass::Failed, _) => Self { write_status: Some(Failed), decrement_stock: false, warning: None },
            (OutcomeClass::Indeterminate, _) => Self { write_status: None, decrement_stock: false, warning: None },
        }
    }

    pub fn new_status(&self, previous: TransactionStatus) -> TransactionStatus {
        self.write_status.unwrap_or(previous)
    }
}
