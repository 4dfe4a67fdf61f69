//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! provider calls) should be expressed as futures or asynchronous functions.
//!
//! ## Routes
//! | Route                                  | Roles                | Handler                |
//! |----------------------------------------|----------------------|------------------------|
//! | `POST /api/payment/webhook`            | none (IP whitelist)  | [`payment_webhook`]    |
//! | `POST /api/payment/manual-update`      | admin                | [`manual_update`]      |
//! | `GET  /api/payment/check-status/{id}`  | any                  | [`check_status`]       |
//! | `POST /api/transactions`               | any                  | [`create_transaction`] |
//! | `GET  /api/transactions`               | any                  | [`transactions`]       |
//! | `GET  /api/transactions/{id}`          | any                  | [`transaction_by_id`]  |
//! | `GET  /api/payments`                   | admin, sales         | [`payments`]           |
//! | `GET  /api/payments/{id}`              | admin, sales         | [`payment_by_id`]      |
//! | `GET  /api/dashboard/earnings`         | admin, sales         | [`earnings`]           |
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use shop_payment_engine::{
    db_types::{NewTransaction, OrderId, ProviderStatus, StatusSource, Transaction},
    traits::{PaymentProvider, ReconciliationDatabase, TransactionManagement},
    LedgerApi,
    ReconcileOutcome,
    ReconciliationApi,
};

use crate::{
    auth::{JwtClaims, Role},
    config::{ServerOptions, SignatureCheck},
    data_objects::{
        CheckStatusResponse,
        CreateTransactionRequest,
        ManualUpdateParams,
        ManualUpdateResponse,
        PaymentDetail,
        PaymentSearchParams,
        TransactionSearchParams,
        WebhookAck,
    },
    errors::ServerError,
    integrations::midtrans::{check_signature, notification_to_status, parse_notification, NotificationError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

fn parse_order_id(path: web::Path<String>) -> Result<OrderId, ServerError> {
    OrderId::from_str(&path.into_inner()).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}

/// Customers may only see their own orders. Staff see everything.
fn check_ownership(claims: &JwtClaims, transaction: &Transaction) -> Result<(), ServerError> {
    if claims.is_staff() || claims.user_id()? == transaction.customer_id {
        Ok(())
    } else {
        Err(ServerError::InsufficientPermissions(format!("Order {} belongs to another customer", transaction.order_id)))
    }
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(payment_webhook => Post "" impl ReconciliationDatabase);
/// The Midtrans HTTP notification endpoint.
///
/// Midtrans retries any notification that is not acknowledged with a 2xx, so this handler always answers
/// `200 {"status": "ok"}`. Malformed payloads, bad signatures, unknown orders and storage failures are logged here
/// and never reported back to the caller.
pub async fn payment_webhook<B>(
    body: web::Bytes,
    signature_check: web::Data<SignatureCheck>,
    api: web::Data<ReconciliationApi<B>>,
) -> HttpResponse
where
    B: ReconciliationDatabase,
{
    trace!("💻️ Received payment notification");
    match process_notification(&body, signature_check.get_ref(), api.get_ref()).await {
        Ok(ReconcileOutcome::UnknownOrder { order_id }) => {
            info!("💻️ Received a payment notification for unknown order {order_id}. Ignoring it.");
        },
        Ok(ReconcileOutcome::Reconciled(result)) => {
            info!(
                "💻️ Payment notification for order {} processed. {} -> {}",
                result.order_id, result.previous_status, result.new_status
            );
        },
        Err(ServerError::InvalidRequestBody(e)) => warn!("💻️ Rejected payment notification. {e}"),
        Err(e) => error!("💻️ Could not process payment notification. {e}"),
    }
    HttpResponse::Ok().json(WebhookAck::default())
}

async fn process_notification<B: ReconciliationDatabase>(
    body: &[u8],
    signature_check: &SignatureCheck,
    api: &ReconciliationApi<B>,
) -> Result<ReconcileOutcome, ServerError> {
    let invalid = |e: NotificationError| ServerError::InvalidRequestBody(e.to_string());
    let notification = parse_notification(body).map_err(invalid)?;
    check_signature(&notification, signature_check).map_err(invalid)?;
    let (order_id, status) = notification_to_status(&notification).map_err(invalid)?;
    debug!("💻️ Notification for order {order_id} reports '{}'", status.status_code);
    let outcome = api.reconcile(&order_id, &status, StatusSource::Webhook).await?;
    Ok(outcome)
}

//----------------------------------------------   Manual update  ----------------------------------------------------
route!(manual_update => Post "/payment/manual-update" impl ReconciliationDatabase, TransactionManagement where requires [Role::Admin]);
/// Lets an admin force a provider status onto an order, e.g. for a bank transfer that was confirmed out of band.
///
/// The status goes through the same reconciliation path as a real notification, so all the usual guarantees hold.
/// The feature must be switched on with `SPG_ENABLE_MANUAL_UPDATE`.
pub async fn manual_update<B>(
    params: web::Query<ManualUpdateParams>,
    options: web::Data<ServerOptions>,
    ledger: web::Data<LedgerApi<B>>,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ReconciliationDatabase + TransactionManagement,
{
    if !options.enable_manual_update {
        return Err(ServerError::FeatureDisabled("Manual payment updates are disabled on this server".to_string()));
    }
    let ManualUpdateParams { order_id, transaction_status } = params.into_inner();
    info!("💻️ Manual '{transaction_status}' update requested for order {order_id}");
    let transaction = ledger
        .transaction(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Transaction {order_id} not found")))?;
    let status = ProviderStatus::new(transaction_status.trim().to_ascii_lowercase())
        .with_provider_txn_id(format!("manual-{order_id}"))
        .with_gross_amount(transaction.total_amount);
    let outcome = api.reconcile(&order_id, &status, StatusSource::Manual).await?;
    let message = match outcome.result() {
        Some(result) => format!("Transaction status updated to {}", result.new_status),
        None => return Err(ServerError::NoRecordFound(format!("Transaction {order_id} not found"))),
    };
    Ok(HttpResponse::Ok().json(ManualUpdateResponse {
        status: "success".to_string(),
        message,
        transaction_id: transaction.id,
        order_id,
        result: outcome,
    }))
}

//----------------------------------------------   Check status  ----------------------------------------------------
route!(check_status => Get "/payment/check-status/{order_id}" impl ReconciliationDatabase, TransactionManagement, PaymentProvider);
/// Pulls the current status of an order from Midtrans and reconciles it. This recovers orders whose notification never
/// arrived.
pub async fn check_status<R, L, P>(
    claims: JwtClaims,
    path: web::Path<String>,
    options: web::Data<ServerOptions>,
    ledger: web::Data<LedgerApi<L>>,
    api: web::Data<ReconciliationApi<R>>,
    provider: web::Data<P>,
) -> Result<HttpResponse, ServerError>
where
    R: ReconciliationDatabase,
    L: TransactionManagement,
    P: PaymentProvider,
{
    let order_id = parse_order_id(path)?;
    debug!("💻️ Status check for order {order_id} requested by {}", claims.sub);
    let transaction = ledger
        .transaction(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Transaction {order_id} not found")))?;
    check_ownership(&claims, &transaction)?;
    let timeout = options.provider_timeout;
    let status = tokio::time::timeout(timeout, provider.query_status(&order_id))
        .await
        .map_err(|_| {
            warn!("💻️ Midtrans did not answer the status query for {order_id} within {}s", timeout.as_secs());
            ServerError::ProviderTimeout(timeout.as_secs())
        })??
        .ok_or_else(|| ServerError::NoRecordFound(format!("Midtrans has no payment for order {order_id}")))?;
    let outcome = api.reconcile(&order_id, &status, StatusSource::Poll).await?;
    let message = match outcome.result() {
        Some(result) => format!("Payment status checked. Order is {}", result.new_status),
        None => return Err(ServerError::NoRecordFound(format!("Transaction {order_id} not found"))),
    };
    Ok(HttpResponse::Ok().json(CheckStatusResponse {
        status: "success".to_string(),
        order_id,
        transaction_status: status.status_code,
        message,
    }))
}

//----------------------------------------------   Transactions  ----------------------------------------------------
route!(create_transaction => Post "/transactions" impl TransactionManagement);
/// Checkout. Customers always buy for themselves; staff must name the customer.
pub async fn create_transaction<B: TransactionManagement>(
    claims: JwtClaims,
    body: web::Json<CreateTransactionRequest>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let customer_id = match claims.role {
        Role::Customer => claims.user_id()?,
        _ => req.customer_id.ok_or_else(|| {
            ServerError::InvalidRequestBody("customer_id is required when creating a transaction as staff".to_string())
        })?,
    };
    let mut transaction = NewTransaction::new(req.order_id, customer_id, req.total_amount);
    if let Some(product_id) = req.product_id {
        transaction = transaction.with_product(product_id, req.quantity);
    }
    if let Some(method) = req.payment_method {
        transaction = transaction.with_payment_method(method);
    }
    let transaction = api.create_transaction(transaction).await?;
    info!("💻️ Created transaction {} for customer {customer_id}", transaction.order_id);
    Ok(HttpResponse::Created().json(transaction))
}

route!(transactions => Get "/transactions" impl TransactionManagement);
pub async fn transactions<B: TransactionManagement>(
    claims: JwtClaims,
    params: web::Query<TransactionSearchParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let mut filter = params.into_inner().into_filter();
    if !claims.is_staff() {
        filter = filter.with_customer_id(claims.user_id()?);
    }
    trace!("💻️ Transaction search: {filter:?}");
    let transactions = api.search_transactions(filter).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

route!(transaction_by_id => Get "/transactions/{order_id}" impl TransactionManagement);
pub async fn transaction_by_id<B: TransactionManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(path)?;
    let transaction = api
        .transaction(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Transaction {order_id} not found")))?;
    check_ownership(&claims, &transaction)?;
    Ok(HttpResponse::Ok().json(transaction))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payments => Get "/payments" impl TransactionManagement where requires [Role::Admin, Role::Sales]);
pub async fn payments<B: TransactionManagement>(
    params: web::Query<PaymentSearchParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payments = api.search_payments(params.into_inner().into_filter()).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(payment_by_id => Get "/payments/{order_id}" impl TransactionManagement where requires [Role::Admin, Role::Sales]);
pub async fn payment_by_id<B: TransactionManagement>(
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(path)?;
    let payment = api
        .payment(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No payment has been reported for order {order_id}")))?;
    let events = api.payment_history(&order_id).await?;
    Ok(HttpResponse::Ok().json(PaymentDetail { payment, events }))
}

//----------------------------------------------   Dashboard  ----------------------------------------------------
route!(earnings => Get "/dashboard/earnings" impl TransactionManagement where requires [Role::Admin, Role::Sales]);
pub async fn earnings<B: TransactionManagement>(api: web::Data<LedgerApi<B>>) -> Result<HttpResponse, ServerError> {
    let summary = api.earnings().await?;
    Ok(HttpResponse::Ok().json(summary))
}
