use serde::{Deserialize, Serialize};

/// The payload of a Midtrans HTTP notification, which is also the body of a Core API status response.
///
/// Midtrans sends every value as a string, and omits fields that do not apply to the payment type, so everything but
/// the order id is optional here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MidtransNotification {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub transaction_time: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
}

impl MidtransNotification {
    /// Midtrans reports "not found" as a 200 response with a `404` status code in the body
    pub fn is_not_found(&self) -> bool {
        self.status_code.as_deref() == Some("404")
    }

    /// True when the body carries a 4xx or 5xx status code. A missing code is not an error.
    pub fn is_error(&self) -> bool {
        self.status_code.as_deref().map(|c| c.starts_with('4') || c.starts_with('5')).unwrap_or(false)
    }
}
