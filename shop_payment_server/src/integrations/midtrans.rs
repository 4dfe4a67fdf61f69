use std::str::FromStr;

use log::*;
use midtrans_tools::{parse_transaction_time, verify_signature, MidtransApi, MidtransApiError, MidtransNotification};
use shop_payment_engine::{
    db_types::{OrderId, ProviderStatus},
    traits::{PaymentProvider, ProviderError},
};
use spg_common::Money;
use thiserror::Error;

use crate::config::SignatureCheck;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Notification is not valid JSON. {0}")]
    MalformedPayload(String),
    #[error("Notification does not contain an order id")]
    MissingOrderId,
    #[error("Notification for order {0} does not contain a transaction status")]
    MissingStatus(String),
    #[error("Notification for order {0} has an invalid signature")]
    InvalidSignature(String),
}

/// Parses a raw notification body. Unknown fields are ignored.
pub fn parse_notification(body: &[u8]) -> Result<MidtransNotification, NotificationError> {
    serde_json::from_slice::<MidtransNotification>(body).map_err(|e| NotificationError::MalformedPayload(e.to_string()))
}

/// Checks `signature_key` against `SHA512(order_id + status_code + gross_amount + server_key)`. A notification without
/// a signature fails the check.
pub fn check_signature(notification: &MidtransNotification, check: &SignatureCheck) -> Result<(), NotificationError> {
    if !check.enabled {
        trace!("🔍️ Signature checks are disabled. Skipping check for order {}", notification.order_id);
        return Ok(());
    }
    let valid = match &notification.signature_key {
        Some(signature) => verify_signature(
            signature,
            &notification.order_id,
            notification.status_code.as_deref().unwrap_or_default(),
            notification.gross_amount.as_deref().unwrap_or_default(),
            check.server_key.reveal(),
        ),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(NotificationError::InvalidSignature(notification.order_id.clone()))
    }
}

/// Normalizes a Midtrans payload into a [`ProviderStatus`]. Used for webhook notifications and status query responses
/// alike, so that both triggers hash to the same event when they report the same thing.
///
/// Unparseable amounts and times are logged and dropped rather than failing the whole notification.
pub fn notification_to_status(n: &MidtransNotification) -> Result<(OrderId, ProviderStatus), NotificationError> {
    let order_id = OrderId::from_str(&n.order_id).map_err(|_| NotificationError::MissingOrderId)?;
    let status_code = n
        .transaction_status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| NotificationError::MissingStatus(n.order_id.clone()))?;
    let mut status = ProviderStatus::new(status_code.to_ascii_lowercase());
    if let Some(id) = &n.transaction_id {
        status = status.with_provider_txn_id(id);
    }
    if let Some(gross) = &n.gross_amount {
        match Money::from_str(gross) {
            Ok(amount) => status = status.with_gross_amount(amount),
            Err(e) => warn!("🔍️ Ignoring gross amount for order {order_id}. {e}"),
        }
    }
    if let Some(payment_type) = &n.payment_type {
        status = status.with_payment_type(payment_type);
    }
    if let Some(fraud_status) = &n.fraud_status {
        status = status.with_fraud_status(fraud_status);
    }
    if let Some(message) = &n.status_message {
        status = status.with_status_message(message);
    }
    if let Some(time) = &n.transaction_time {
        match parse_transaction_time(time) {
            Some(t) => status = status.with_occurred_at(t),
            None => warn!("🔍️ Ignoring unparseable transaction time '{time}' for order {order_id}"),
        }
    }
    Ok((order_id, status))
}

//--------------------------------------    MidtransProvider   ---------------------------------------------------------
/// The Midtrans Core API, as seen by the poll trigger.
#[derive(Clone)]
pub struct MidtransProvider {
    api: MidtransApi,
}

impl MidtransProvider {
    pub fn new(api: MidtransApi) -> Self {
        Self { api }
    }
}

impl PaymentProvider for MidtransProvider {
    async fn query_status(&self, order_id: &OrderId) -> Result<Option<ProviderStatus>, ProviderError> {
        let notification = self.api.transaction_status(order_id.as_str()).await.map_err(|e| match e {
            MidtransApiError::JsonError(s) | MidtransApiError::RestResponseError(s) => {
                ProviderError::InvalidResponse(s)
            },
            e => ProviderError::Unavailable(e.to_string()),
        })?;
        let Some(mut notification) = notification else {
            debug!("🔍️ Midtrans does not know order {order_id}");
            return Ok(None);
        };
        // Status responses always echo the order id, but don't rely on it
        if notification.order_id.trim().is_empty() {
            notification.order_id = order_id.to_string();
        }
        let (_, status) =
            notification_to_status(&notification).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(Some(status))
    }
}
