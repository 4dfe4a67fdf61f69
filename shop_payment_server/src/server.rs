use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::future::{ok, Either};
use log::{info, warn};
use midtrans_tools::MidtransApi;
use shop_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers, StockExhaustedEvent, TransactionPaidEvent},
    LedgerApi,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions, SignatureCheck},
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::midtrans::MidtransProvider,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        CheckStatusRoute,
        CreateTransactionRoute,
        EarningsRoute,
        ManualUpdateRoute,
        PaymentByIdRoute,
        PaymentWebhookRoute,
        PaymentsRoute,
        TransactionByIdRoute,
        TransactionsRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(config.event_buffer_size, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The hooks the server always runs. Stock shortfalls on settled orders need a human, so they are logged loudly.
pub fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_transaction_paid(|ev: TransactionPaidEvent| {
            Box::pin(async move {
                info!("📬️ Order {} has been paid (transaction #{})", ev.order_id(), ev.result.transaction_id);
            })
        })
        .on_stock_exhausted(|ev: StockExhaustedEvent| {
            Box::pin(async move {
                warn!(
                    "📬️ 🚨️ Order {} was paid, but product {} only had {} in stock against {} ordered. Restock or \
                     refund the customer.",
                    ev.order_id, ev.product_id, ev.available, ev.requested
                );
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let midtrans_api =
        MidtransApi::new(config.midtrans.api.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let reconciliation_api = ReconciliationApi::new(db.clone(), producers.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let provider = MidtransProvider::new(midtrans_api.clone());
        let options = ServerOptions::from_config(&config);
        let signature_check = SignatureCheck::from_config(&config.midtrans);
        let validator = TokenValidator::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(provider))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(signature_check));
        let whitelist = config.midtrans.whitelist.clone();
        // Must be registered before the `/api` scope, which would otherwise swallow it
        let webhook_scope = web::scope("/api/payment/webhook")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded);
                let whitelisted = match (peer_ip, &whitelist) {
                    (_, None) => true,
                    (Some(ip), Some(whitelist)) => {
                        info!("💻️ Payment notification from {ip}");
                        whitelist.contains(&ip)
                    },
                    (None, Some(_)) => {
                        warn!("💻️ No IP address found in payment notification request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    Either::Left(srv.call(req))
                } else {
                    warn!("💻️ Payment notification from {peer_ip:?} is not on the whitelist. Denying access.");
                    let err = ServerError::InsufficientPermissions("Remote address is not whitelisted".to_string());
                    Either::Right(ok(req.error_response(err)))
                }
            })
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(validator))
            .service(ManualUpdateRoute::<SqliteDatabase>::new())
            .service(CheckStatusRoute::<SqliteDatabase, SqliteDatabase, MidtransProvider>::new())
            .service(CreateTransactionRoute::<SqliteDatabase>::new())
            .service(TransactionsRoute::<SqliteDatabase>::new())
            .service(TransactionByIdRoute::<SqliteDatabase>::new())
            .service(PaymentsRoute::<SqliteDatabase>::new())
            .service(PaymentByIdRoute::<SqliteDatabase>::new())
            .service(EarningsRoute::<SqliteDatabase>::new());
        app.service(health).service(webhook_scope).service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
