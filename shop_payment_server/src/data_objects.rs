use std::fmt::Display;

use serde::{Deserialize, Serialize};
use shop_payment_engine::{
    db_types::{OrderId, Payment, PaymentEvent, TransactionStatus},
    traits::{PaymentQueryFilter, TransactionQueryFilter, DEFAULT_PAGE_SIZE},
    ReconcileOutcome,
};
use spg_common::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The webhook's reply. Midtrans retries anything but a 2xx, so this is returned even when the notification was
/// rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
}

impl Default for WebhookAck {
    fn default() -> Self {
        Self { status: "ok".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualUpdateParams {
    pub order_id: OrderId,
    /// A provider status code, e.g. `settlement` or `expire`
    pub transaction_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualUpdateResponse {
    pub status: String,
    pub message: String,
    pub transaction_id: i64,
    pub order_id: OrderId,
    pub result: ReconcileOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckStatusResponse {
    pub status: String,
    pub order_id: OrderId,
    /// The status reported by Midtrans
    pub transaction_status: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionSearchParams {
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl TransactionSearchParams {
    pub fn into_filter(self) -> TransactionQueryFilter {
        let filter = TransactionQueryFilter::default()
            .with_pagination(self.skip.unwrap_or(0), self.limit.unwrap_or(DEFAULT_PAGE_SIZE));
        match self.status {
            Some(status) => filter.with_status(status),
            None => filter,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSearchParams {
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PaymentSearchParams {
    pub fn into_filter(self) -> PaymentQueryFilter {
        let filter = PaymentQueryFilter::default()
            .with_pagination(self.skip.unwrap_or(0), self.limit.unwrap_or(DEFAULT_PAGE_SIZE));
        match self.transaction_status {
            Some(status) => filter.with_transaction_status(status),
            None => filter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub order_id: OrderId,
    /// Ignored for customers, who always buy for themselves. Required for staff.
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub total_amount: Money,
    #[serde(default)]
    pub payment_method: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub payment: Payment,
    pub events: Vec<PaymentEvent>,
}
