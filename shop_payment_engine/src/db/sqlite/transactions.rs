use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::{products, SqliteDatabaseError},
    db_types::{NewTransaction, OrderId, Transaction, TransactionStatus},
    traits::{EarningsSummary, TransactionQueryFilter},
};

const TRANSACTION_COLUMNS: &str = "id, order_id, customer_id, product_id, quantity, total_amount, status, \
                                   payment_method, midtrans_transaction_id, created_at, updated_at";

/// Takes SQLite's write lock and pins the transaction row for `order_id`.
///
/// This must be the first statement of a reconciliation. SQLite upgrades the connection to a RESERVED lock on the
/// first write, so every concurrent writer queues in the busy handler until we commit, and any read that follows sees
/// the state left by the previous writer. Returns `false` if there is no transaction for the order.
pub async fn lock_transaction(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE transactions SET updated_at = updated_at WHERE order_id = $1")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Checks the usual checkout rules and inserts a new pending transaction. This is not atomic on its own. Run it
/// inside a database transaction by passing `&mut *tx` as the connection.
pub async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, SqliteDatabaseError> {
    if transaction.quantity < 1 {
        return Err(SqliteDatabaseError::InvalidQuantity(transaction.quantity));
    }
    if fetch_transaction_by_order_id(&transaction.order_id, conn).await?.is_some() {
        return Err(SqliteDatabaseError::DuplicateOrder(transaction.order_id));
    }
    if let Some(product_id) = transaction.product_id {
        let product =
            products::fetch_product(product_id, conn).await?.ok_or(SqliteDatabaseError::ProductNotFound(product_id))?;
        if product.stock < transaction.quantity {
            return Err(SqliteDatabaseError::InsufficientStock {
                product_id,
                available: product.stock,
                requested: transaction.quantity,
            });
        }
    }
    let sql = format!(
        "INSERT INTO transactions (order_id, customer_id, product_id, quantity, total_amount, payment_method) VALUES \
         ($1, $2, $3, $4, $5, $6) RETURNING {TRANSACTION_COLUMNS}"
    );
    let result = sqlx::query_as::<_, Transaction>(&sql)
        .bind(&transaction.order_id)
        .bind(transaction.customer_id)
        .bind(transaction.product_id)
        .bind(transaction.quantity)
        .bind(transaction.total_amount)
        .bind(&transaction.payment_method)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Transaction #{} for order {} has been saved", result.id, result.order_id);
    Ok(result)
}

pub async fn fetch_transaction_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, SqliteDatabaseError> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE order_id = $1");
    let result = sqlx::query_as::<_, Transaction>(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(result)
}

pub async fn fetch_transactions(
    query: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {TRANSACTION_COLUMNS} FROM transactions "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if !query.statuses.is_empty() {
        where_clause.push("status IN (");
        for (i, status) in query.statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset);
    trace!("🗃️ Executing query: {}", builder.sql());
    let transactions = builder.build_query_as::<Transaction>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_transactions: {}", transactions.len());
    Ok(transactions)
}

/// Writes a new status for the transaction. A provider transaction id, if given, replaces the stored one.
pub async fn update_status(
    id: i64,
    status: TransactionStatus,
    provider_txn_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE transactions SET status = $1, midtrans_transaction_id = COALESCE($2, midtrans_transaction_id), \
         updated_at = CURRENT_TIMESTAMP WHERE id = $3",
    )
    .bind(status)
    .bind(provider_txn_id)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::QueryError(format!("Transaction #{id} vanished during a status update")));
    }
    trace!("🗃️ Transaction #{id} is now {status}");
    Ok(())
}

pub async fn earnings(conn: &mut SqliteConnection) -> Result<EarningsSummary, SqliteDatabaseError> {
    let summary = sqlx::query_as::<_, EarningsSummary>(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN status = 'paid' THEN total_amount ELSE 0 END), 0) AS total_earnings,
            COALESCE(SUM(CASE WHEN status = 'paid' THEN 1 ELSE 0 END), 0) AS paid_count,
            COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_count,
            COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) AS failed_count
        FROM transactions
        "#,
    )
    .fetch_one(conn)
    .await?;
    Ok(summary)
}
