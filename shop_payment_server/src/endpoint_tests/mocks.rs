use std::time::Duration;

use mockall::mock;
use shop_payment_engine::{
    db_types::{NewTransaction, OrderId, Payment, PaymentEvent, ProviderStatus, StatusSource, Transaction},
    traits::{
        EarningsSummary,
        LedgerError,
        PaymentProvider,
        PaymentQueryFilter,
        ProviderError,
        ReconciliationDatabase,
        ReconciliationError,
        TransactionManagement,
        TransactionQueryFilter,
    },
    ReconcileOutcome,
};

mock! {
    pub ShopDb {}
    impl ReconciliationDatabase for ShopDb {
        async fn reconcile_payment_status(&self, order_id: &OrderId, status: &ProviderStatus, source: StatusSource) -> Result<ReconcileOutcome, ReconciliationError>;
        async fn close(&mut self) -> Result<(), ReconciliationError>;
    }
    impl TransactionManagement for ShopDb {
        async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, LedgerError>;
        async fn fetch_transaction(&self, order_id: &OrderId) -> Result<Option<Transaction>, LedgerError>;
        async fn fetch_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, LedgerError>;
        async fn fetch_payment(&self, order_id: &OrderId) -> Result<Option<Payment>, LedgerError>;
        async fn fetch_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, LedgerError>;
        async fn fetch_payment_events(&self, order_id: &OrderId) -> Result<Vec<PaymentEvent>, LedgerError>;
        async fn earnings(&self) -> Result<EarningsSummary, LedgerError>;
    }
}

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        async fn query_status(&self, order_id: &OrderId) -> Result<Option<ProviderStatus>, ProviderError>;
    }
}

/// A provider that takes longer to answer than any sane timeout
pub struct SlowProvider(pub Duration);

impl PaymentProvider for SlowProvider {
    async fn query_status(&self, _order_id: &OrderId) -> Result<Option<ProviderStatus>, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(Some(ProviderStatus::new("settlement")))
    }
}
