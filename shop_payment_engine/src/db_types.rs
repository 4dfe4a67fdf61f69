use std::{fmt::Display, str::FromStr};

use blake2::{Blake2s256, Digest};
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use spg_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Order ids cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created at checkout. No settlement has been reported yet.
    Pending,
    /// The provider reported the funds as settled or captured.
    Paid,
    /// The provider denied, cancelled or expired the payment.
    Failed,
    /// Cancelled outside the payment flow.
    Cancelled,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Paid => write!(f, "paid"),
            TransactionStatus::Failed => write!(f, "failed"),
            TransactionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid transaction status: {value}. But this conversion cannot fail. Defaulting to Pending");
            TransactionStatus::Pending
        })
    }
}

//--------------------------------------      Transaction      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: i64,
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub total_amount: Money,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub midtrans_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewTransaction     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    /// The order id handed to the payment provider. Must be unique.
    pub order_id: OrderId,
    /// The user id of the purchasing customer
    pub customer_id: i64,
    /// Custom orders do not reference a catalog product
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

impl NewTransaction {
    pub fn new(order_id: OrderId, customer_id: i64, total_amount: Money) -> Self {
        Self { order_id, customer_id, product_id: None, quantity: 1, total_amount, payment_method: None }
    }

    pub fn with_product(mut self, product_id: i64, quantity: i64) -> Self {
        self.product_id = Some(product_id);
        self.quantity = quantity;
        self
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Money, stock: i64) -> Self {
        Self { name: name.into(), price, stock }
    }
}

//--------------------------------------      StatusSource     ---------------------------------------------------------
/// Which trigger delivered a provider status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    Webhook,
    Manual,
    Poll,
}

impl Display for StatusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusSource::Webhook => write!(f, "webhook"),
            StatusSource::Manual => write!(f, "manual"),
            StatusSource::Poll => write!(f, "poll"),
        }
    }
}

//--------------------------------------      OutcomeClass     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeClass {
    /// `settlement` or `capture`
    Settled,
    /// `deny`, `cancel` or `expire`
    Failed,
    /// Everything else, e.g. `pending`. The transaction status is left alone.
    Indeterminate,
}

impl OutcomeClass {
    pub fn classify(status_code: &str) -> Self {
        match status_code.trim().to_ascii_lowercase().as_str() {
            "settlement" | "capture" => Self::Settled,
            "deny" | "cancel" | "expire" => Self::Failed,
            _ => Self::Indeterminate,
        }
    }
}

impl Display for OutcomeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeClass::Settled => write!(f, "settled"),
            OutcomeClass::Failed => write!(f, "failed"),
            OutcomeClass::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

//--------------------------------------     ProviderStatus    ---------------------------------------------------------
/// A provider-reported payment status, normalized from whichever trigger delivered it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// The provider's raw status vocabulary: `settlement`, `capture`, `pending`, `deny`, `cancel`, `expire`, ...
    pub status_code: String,
    pub provider_txn_id: Option<String>,
    pub gross_amount: Option<Money>,
    pub payment_type: Option<String>,
    pub fraud_status: Option<String>,
    pub status_message: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl ProviderStatus {
    pub fn new<S: Into<String>>(status_code: S) -> Self {
        Self { status_code: status_code.into(), ..Default::default() }
    }

    pub fn with_provider_txn_id<S: Into<String>>(mut self, id: S) -> Self {
        self.provider_txn_id = Some(id.into());
        self
    }

    pub fn with_gross_amount(mut self, amount: Money) -> Self {
        self.gross_amount = Some(amount);
        self
    }

    pub fn with_payment_type<S: Into<String>>(mut self, payment_type: S) -> Self {
        self.payment_type = Some(payment_type.into());
        self
    }

    pub fn with_fraud_status<S: Into<String>>(mut self, fraud_status: S) -> Self {
        self.fraud_status = Some(fraud_status.into());
        self
    }

    pub fn with_status_message<S: Into<String>>(mut self, message: S) -> Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn with_occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    pub fn outcome(&self) -> OutcomeClass {
        OutcomeClass::classify(&self.status_code)
    }

    /// A hex-encoded BLAKE2s digest over the order id and every reported field. Two deliveries of the same
    /// notification produce the same hash, regardless of which trigger delivered them.
    pub fn content_hash(&self, order_id: &OrderId) -> String {
        fn field(hasher: &mut Blake2s256, value: Option<&str>) {
            match value {
                Some(v) => {
                    hasher.update([1u8]);
                    hasher.update((v.len() as u64).to_le_bytes());
                    hasher.update(v.as_bytes());
                },
                None => hasher.update([0u8]),
            }
        }
        let mut hasher = Blake2s256::new();
        let gross = self.gross_amount.map(|g| g.cents().to_string());
        let occurred = self.occurred_at.map(|t| t.timestamp_micros().to_string());
        field(&mut hasher, Some(order_id.as_str()));
        field(&mut hasher, Some(self.status_code.as_str()));
        field(&mut hasher, self.provider_txn_id.as_deref());
        field(&mut hasher, gross.as_deref());
        field(&mut hasher, self.payment_type.as_deref());
        field(&mut hasher, self.fraud_status.as_deref());
        field(&mut hasher, self.status_message.as_deref());
        field(&mut hasher, occurred.as_deref());
        format!("{:x}", hasher.finalize())
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
/// The latest provider-reported state for an order. This is a projection of the order's [`PaymentEvent`] log.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub transaction_id: i64,
    pub order_id: OrderId,
    pub gross_amount: Money,
    pub payment_type: Option<String>,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub transaction_time: Option<DateTime<Utc>>,
    pub status_message: Option<String>,
    pub midtrans_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      PaymentEvent     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: i64,
    pub transaction_id: i64,
    pub order_id: OrderId,
    pub content_hash: String,
    pub source: StatusSource,
    pub status_code: String,
    pub provider_txn_id: Option<String>,
    pub gross_amount: Option<Money>,
    pub payment_type: Option<String>,
    pub fraud_status: Option<String>,
    pub status_message: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
}
