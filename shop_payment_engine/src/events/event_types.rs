use serde::{Deserialize, Serialize};

use crate::{db_types::OrderId, spe_api::reconcile_objects::ReconcileResult};

/// Published once per order, after the reconciliation that moved it into `paid` has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPaidEvent {
    pub result: ReconcileResult,
}

impl TransactionPaidEvent {
    pub fn order_id(&self) -> &OrderId {
        &self.result.order_id
    }
}

/// A settled order could not take its stock. This is an operational alert; the order is still paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockExhaustedEvent {
    pub order_id: OrderId,
    pub product_id: i64,
    pub available: i64,
    pub requested: i64,
}
