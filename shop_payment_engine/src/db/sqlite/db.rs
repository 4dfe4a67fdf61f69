use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, payments, products, transactions, SqliteDatabaseError};
use crate::{
    db_types::{
        NewProduct,
        NewTransaction,
        OrderId,
        OutcomeClass,
        Payment,
        PaymentEvent,
        Product,
        ProviderStatus,
        StatusSource,
        Transaction,
        TransactionStatus,
    },
    spe_api::reconcile_objects::{ReconcileOutcome, ReconcileResult, ReconcileWarning, TransitionPlan},
    traits::{
        EarningsSummary,
        InventoryManagement,
        LedgerError,
        PaymentQueryFilter,
        ReconciliationDatabase,
        ReconciliationError,
        TransactionManagement,
        TransactionQueryFilter,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SPG_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await.map_err(sqlx::Error::from)?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs the read-modify-write cycle for one status report inside a single database transaction.
    async fn reconcile_in_tx(
        &self,
        order_id: &OrderId,
        status: &ProviderStatus,
        source: StatusSource,
    ) -> Result<ReconcileOutcome, SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        if !transactions::lock_transaction(order_id, &mut tx).await? {
            tx.rollback().await?;
            return Ok(ReconcileOutcome::UnknownOrder { order_id: order_id.clone() });
        }
        let transaction = transactions::fetch_transaction_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| SqliteDatabaseError::QueryError(format!("Transaction for {order_id} vanished under lock")))?;
        let previous_status = transaction.status;
        let inserted = payments::append_event(&transaction, status, source, &mut tx).await?;
        payments::upsert_payment(&transaction, status, source, &mut tx).await?;

        let outcome = status.outcome();
        let plan = TransitionPlan::new(previous_status, outcome, &status.status_code);
        let mut warnings = Vec::new();
        if let Some(new_status) = plan.write_status {
            // A manual id never replaces one that Midtrans reported
            let keep_stored_id = source == StatusSource::Manual && transaction.midtrans_transaction_id.is_some();
            let provider_txn_id = match outcome {
                OutcomeClass::Settled if !keep_stored_id => status.provider_txn_id.as_deref(),
                _ => None,
            };
            transactions::update_status(transaction.id, new_status, provider_txn_id, &mut tx).await?;
        }
        let mut stock_decremented = false;
        if plan.decrement_stock {
            if let Some(product_id) = transaction.product_id {
                stock_decremented = products::decrement_stock(product_id, transaction.quantity, &mut tx).await?;
                if !stock_decremented {
                    let warning = match products::fetch_product(product_id, &mut tx).await? {
                        Some(p) => ReconcileWarning::StockExhausted {
                            product_id,
                            available: p.stock,
                            requested: transaction.quantity,
                        },
                        None => ReconcileWarning::ProductMissing { product_id },
                    };
                    warnings.push(warning);
                }
            }
        }
        warnings.extend(plan.warning.clone());
        tx.commit().await?;

        let result = ReconcileResult {
            transaction_id: transaction.id,
            order_id: order_id.clone(),
            outcome,
            previous_status,
            new_status: plan.new_status(previous_status),
            stock_decremented,
            duplicate_event: !inserted,
            warnings,
        };
        Ok(ReconcileOutcome::Reconciled(result))
    }
}

impl ReconciliationDatabase for SqliteDatabase {
    async fn reconcile_payment_status(
        &self,
        order_id: &OrderId,
        status: &ProviderStatus,
        source: StatusSource,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        let outcome = self.reconcile_in_tx(order_id, status, source).await?;
        let result = match &outcome {
            ReconcileOutcome::UnknownOrder { .. } => {
                info!("🗃️ Received a '{}' {source} status for unknown order {order_id}. Ignoring it.", status.status_code);
                return Ok(outcome);
            },
            ReconcileOutcome::Reconciled(r) => r,
        };
        if result.previous_status != result.new_status {
            info!(
                "🗃️ Order {order_id} moved from {} to {} after a '{}' {source} status",
                result.previous_status, result.new_status, status.status_code
            );
        }
        if result.newly_paid() && result.previous_status != TransactionStatus::Pending {
            warn!("🗃️ Order {order_id} was settled after it was marked {}", result.previous_status);
        }
        for warning in &result.warnings {
            match warning {
                ReconcileWarning::SettledOrderReportedFailed { .. } => error!("🗃️ Order {order_id}: {warning}"),
                _ => warn!("🗃️ Order {order_id}: {warning}"),
            }
        }
        Ok(outcome)
    }

    async fn close(&mut self) -> Result<(), ReconciliationError> {
        self.pool.close().await;
        Ok(())
    }
}

impl TransactionManagement for SqliteDatabase {
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = transactions::insert_transaction(transaction, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_transaction(&self, order_id: &OrderId) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::fetch_transaction_by_order_id(order_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::fetch_transactions(query, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_payment(&self, order_id: &OrderId) -> Result<Option<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::fetch_payment(order_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::fetch_payments(query, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_payment_events(&self, order_id: &OrderId) -> Result<Vec<PaymentEvent>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::fetch_payment_events(order_id, &mut conn).await?;
        Ok(result)
    }

    async fn earnings(&self) -> Result<EarningsSummary, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::earnings(&mut conn).await?;
        Ok(result)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = products::fetch_product(id, &mut conn).await?;
        Ok(result)
    }
}
