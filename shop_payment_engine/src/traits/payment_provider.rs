use thiserror::Error;

use crate::db_types::{OrderId, ProviderStatus};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The payment provider did not respond within {0} seconds")]
    Timeout(u64),
    #[error("The payment provider is unavailable. {0}")]
    Unavailable(String),
    #[error("The payment provider sent an unexpected response. {0}")]
    InvalidResponse(String),
}

/// The payment provider's status API.
///
/// Implementations make a network call and should be treated as unreliable. Timeouts and retries are the caller's
/// concern.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Queries the provider for the current status of `order_id`.
    ///
    /// Returns `None` if the provider does not know the order.
    async fn query_status(&self, order_id: &OrderId) -> Result<Option<ProviderStatus>, ProviderError>;
}
