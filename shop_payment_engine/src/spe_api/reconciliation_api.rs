use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{OrderId, ProviderStatus, StatusSource},
    events::{EventProducers, StockExhaustedEvent, TransactionPaidEvent},
    spe_api::reconcile_objects::{ReconcileOutcome, ReconcileResult, ReconcileWarning},
    traits::{ReconciliationDatabase, ReconciliationError},
};

/// `ReconciliationApi` is the single entry point for payment status updates, whichever trigger delivered them
/// (provider webhook, operator override or status poll).
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> ReconciliationApi<B>
where B: ReconciliationDatabase
{
    /// Merges a provider-reported status for `order_id` into the ledger.
    ///
    /// Calls are idempotent. Re-delivering a status that has already been applied changes nothing, and stock is taken
    /// at most once per transaction, no matter how many settlement reports arrive or how they interleave.
    ///
    /// Hooks are notified only after the changes have been committed.
    pub async fn reconcile(
        &self,
        order_id: &OrderId,
        status: &ProviderStatus,
        source: StatusSource,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        trace!("🔄️ Reconciling '{}' status for order {order_id} from {source}", status.status_code);
        let outcome = self.db.reconcile_payment_status(order_id, status, source).await?;
        if let ReconcileOutcome::Reconciled(result) = &outcome {
            if result.newly_paid() {
                self.call_transaction_paid_hook(result).await;
            }
            self.call_stock_exhausted_hook(result).await;
            debug!(
                "🔄️ Order {order_id} reconciled. {} -> {}. Stock taken: {}. Duplicate: {}",
                result.previous_status, result.new_status, result.stock_decremented, result.duplicate_event
            );
        }
        Ok(outcome)
    }

    async fn call_transaction_paid_hook(&self, result: &ReconcileResult) {
        for emitter in &self.producers.transaction_paid_producer {
            debug!("🔄️ Notifying transaction paid hook subscribers");
            let event = TransactionPaidEvent { result: result.clone() };
            emitter.publish_event(event).await;
        }
    }

    async fn call_stock_exhausted_hook(&self, result: &ReconcileResult) {
        for warning in &result.warnings {
            if let ReconcileWarning::StockExhausted { product_id, available, requested } = warning {
                for emitter in &self.producers.stock_exhausted_producer {
                    debug!("🔄️ Notifying stock exhausted hook subscribers");
                    let event = StockExhaustedEvent {
                        order_id: result.order_id.clone(),
                        product_id: *product_id,
                        available: *available,
                        requested: *requested,
                    };
                    emitter.publish_event(event).await;
                }
            }
        }
    }
}
