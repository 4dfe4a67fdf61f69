use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{OrderId, Payment, PaymentEvent, ProviderStatus, StatusSource, Transaction},
    traits::PaymentQueryFilter,
};

const PAYMENT_COLUMNS: &str = "id, transaction_id, order_id, gross_amount, payment_type, transaction_status, \
                               fraud_status, transaction_time, status_message, midtrans_transaction_id, created_at, \
                               updated_at";

const EVENT_COLUMNS: &str = "id, transaction_id, order_id, content_hash, source, status_code, provider_txn_id, \
                             gross_amount, payment_type, fraud_status, status_message, occurred_at, received_at";

/// Appends the status report to the payment event log. Returns `false` if an identical report was already recorded.
pub async fn append_event(
    transaction: &Transaction,
    status: &ProviderStatus,
    source: StatusSource,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let hash = status.content_hash(&transaction.order_id);
    let result = sqlx::query(
        r#"
        INSERT INTO payment_events (
            transaction_id,
            order_id,
            content_hash,
            source,
            status_code,
            provider_txn_id,
            gross_amount,
            payment_type,
            fraud_status,
            status_message,
            occurred_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (content_hash) DO NOTHING
        "#,
    )
    .bind(transaction.id)
    .bind(&transaction.order_id)
    .bind(&hash)
    .bind(source)
    .bind(&status.status_code)
    .bind(&status.provider_txn_id)
    .bind(status.gross_amount)
    .bind(&status.payment_type)
    .bind(&status.fraud_status)
    .bind(&status.status_message)
    .bind(status.occurred_at)
    .execute(conn)
    .await?;
    let inserted = result.rows_affected() > 0;
    trace!("🗃️ Payment event {hash} for order {} recorded: {inserted}", transaction.order_id);
    Ok(inserted)
}

/// Provider reports overwrite the status fields (`transaction_status`, `fraud_status` and `status_message`). They
/// only overwrite `midtrans_transaction_id`, `transaction_time` and `payment_type` when they carry a value.
const PROVIDER_UPDATE: &str = "
    transaction_status = excluded.transaction_status,
    fraud_status = excluded.fraud_status,
    status_message = excluded.status_message,
    midtrans_transaction_id = COALESCE(excluded.midtrans_transaction_id, payments.midtrans_transaction_id),
    transaction_time = COALESCE(excluded.transaction_time, payments.transaction_time),
    payment_type = COALESCE(excluded.payment_type, payments.payment_type),
    updated_at = CURRENT_TIMESTAMP";

/// Manual updates carry no provider data, so they only touch the status of an existing row.
const MANUAL_UPDATE: &str = "
    transaction_status = excluded.transaction_status,
    updated_at = CURRENT_TIMESTAMP";

/// Projects the status report onto the order's payment row, creating it on the first report.
///
/// The gross amount is fixed by the first report (or the transaction total). See [`PROVIDER_UPDATE`] and
/// [`MANUAL_UPDATE`] for what later reports change.
pub async fn upsert_payment(
    transaction: &Transaction,
    status: &ProviderStatus,
    source: StatusSource,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let gross_amount = status.gross_amount.unwrap_or(transaction.total_amount);
    let on_conflict = match source {
        StatusSource::Manual => MANUAL_UPDATE,
        StatusSource::Webhook | StatusSource::Poll => PROVIDER_UPDATE,
    };
    let sql = format!(
        "INSERT INTO payments (transaction_id, order_id, gross_amount, payment_type, transaction_status, fraud_status, \
         transaction_time, status_message, midtrans_transaction_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (order_id) DO UPDATE SET {on_conflict}"
    );
    sqlx::query(&sql)
        .bind(transaction.id)
        .bind(&transaction.order_id)
        .bind(gross_amount)
        .bind(&status.payment_type)
        .bind(&status.status_code)
        .bind(&status.fraud_status)
        .bind(status.occurred_at)
        .bind(&status.status_message)
        .bind(&status.provider_txn_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Payment for order {} is now '{}' ({source})", transaction.order_id, status.status_code);
    Ok(())
}

pub async fn fetch_payment(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SqliteDatabaseError> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1");
    let payment = sqlx::query_as::<_, Payment>(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments(
    query: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments "));
    if let Some(status) = query.transaction_status {
        builder.push("WHERE transaction_status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset);
    trace!("🗃️ Executing query: {}", builder.sql());
    let payments = builder.build_query_as::<Payment>().fetch_all(conn).await?;
    Ok(payments)
}

pub async fn fetch_payment_events(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentEvent>, SqliteDatabaseError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM payment_events WHERE order_id = $1 ORDER BY id ASC");
    let events = sqlx::query_as::<_, PaymentEvent>(&sql).bind(order_id).fetch_all(conn).await?;
    Ok(events)
}
