use thiserror::Error;

use crate::{
    db_types::{OrderId, ProviderStatus, StatusSource},
    spe_api::reconcile_objects::ReconcileOutcome,
};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}

/// The write path for provider-reported payment statuses.
///
/// Backends own the atomicity of reconciliation: the whole read-modify-write cycle for an order (payment event log,
/// payment projection, transaction status and product stock) must commit or roll back as one unit, and must be
/// serialized against concurrent calls for the same order.
///
/// The decision of *what* to write is not left to backends. They must apply [`crate::TransitionPlan`] to the state
/// they read under the lock.
#[allow(async_fn_in_trait)]
pub trait ReconciliationDatabase {
    /// Merges `status` into the ledger for `order_id`.
    ///
    /// If no transaction exists for `order_id`, nothing is written and [`ReconcileOutcome::UnknownOrder`] is returned.
    async fn reconcile_payment_status(
        &self,
        order_id: &OrderId,
        status: &ProviderStatus,
        source: StatusSource,
    ) -> Result<ReconcileOutcome, ReconciliationError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), ReconciliationError> {
        Ok(())
    }
}
