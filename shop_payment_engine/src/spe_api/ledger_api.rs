use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, NewTransaction, OrderId, Payment, PaymentEvent, Product, Transaction},
    traits::{
        EarningsSummary,
        InventoryManagement,
        LedgerError,
        PaymentQueryFilter,
        TransactionManagement,
        TransactionQueryFilter,
    },
};

/// Checkout and read access to the transaction ledger, the payment record store and the inventory ledger.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: TransactionManagement
{
    pub async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction, LedgerError> {
        let order_id = transaction.order_id.clone();
        let result = self.db.insert_transaction(transaction).await;
        match &result {
            Ok(t) => debug!("🔄️ New transaction #{} created for order {order_id}", t.id),
            Err(e) => debug!("🔄️ Could not create transaction for order {order_id}. {e}"),
        }
        result
    }

    pub async fn transaction(&self, order_id: &OrderId) -> Result<Option<Transaction>, LedgerError> {
        self.db.fetch_transaction(order_id).await
    }

    pub async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, LedgerError> {
        self.db.fetch_transactions(query).await
    }

    pub async fn payment(&self, order_id: &OrderId) -> Result<Option<Payment>, LedgerError> {
        self.db.fetch_payment(order_id).await
    }

    pub async fn payment_history(&self, order_id: &OrderId) -> Result<Vec<PaymentEvent>, LedgerError> {
        self.db.fetch_payment_events(order_id).await
    }

    pub async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, LedgerError> {
        self.db.fetch_payments(query).await
    }

    pub async fn earnings(&self) -> Result<EarningsSummary, LedgerError> {
        self.db.earnings().await
    }
}

impl<B> LedgerApi<B>
where B: InventoryManagement
{
    pub async fn add_product(&self, product: NewProduct) -> Result<Product, LedgerError> {
        self.db.insert_product(product).await
    }

    pub async fn product(&self, id: i64) -> Result<Option<Product>, LedgerError> {
        self.db.fetch_product(id).await
    }
}
