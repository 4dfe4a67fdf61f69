use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use shop_payment_engine::{
    db_types::{OrderId, ProviderStatus, StatusSource, TransactionStatus},
    events::EventProducers,
    traits::{PaymentProvider, ProviderError},
    LedgerApi,
    ReconcileOutcome,
    ReconciliationApi,
};
use spg_common::Money;

use super::{
    helpers::{api_request, issue_token, reconciled, sample_transaction},
    mocks::{MockProvider, MockShopDb, SlowProvider},
};
use crate::{
    auth::Role,
    config::ServerOptions,
    routes::{CheckStatusRoute, ManualUpdateRoute},
};

fn options(enable_manual_update: bool) -> ServerOptions {
    ServerOptions { enable_manual_update, provider_timeout: Duration::from_millis(200), ..Default::default() }
}

/// `ledger` answers transaction lookups, `reconciler` takes the reconciliation call
fn configure_with<P: PaymentProvider + 'static>(
    ledger: MockShopDb,
    reconciler: MockShopDb,
    provider: P,
    options: ServerOptions,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(LedgerApi::new(ledger)))
            .app_data(web::Data::new(ReconciliationApi::new(reconciler, EventProducers::default())))
            .app_data(web::Data::new(provider))
            .app_data(web::Data::new(options))
            .service(ManualUpdateRoute::<MockShopDb>::new())
            .service(CheckStatusRoute::<MockShopDb, MockShopDb, P>::new());
    }
}

fn ledger_with_order(customer_id: i64) -> MockShopDb {
    let mut ledger = MockShopDb::new();
    ledger
        .expect_fetch_transaction()
        .withf(|oid| oid.as_str() == "ORD-1")
        .returning(move |_| Ok(Some(sample_transaction("ORD-1", customer_id, TransactionStatus::Pending))));
    ledger
}

fn idle_reconciler() -> MockShopDb {
    let mut db = MockShopDb::new();
    db.expect_reconcile_payment_status().never();
    db
}

fn idle_provider() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_query_status().never();
    provider
}

//----------------------------------------------   Manual update  ----------------------------------------------------

#[actix_web::test]
async fn manual_update_is_disabled_by_default() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::post().uri("/api/payment/manual-update?order_id=ORD-1&transaction_status=settlement");
    let configure = configure_with(MockShopDb::new(), idle_reconciler(), idle_provider(), options(false));
    let (status, body) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("disabled"));
}

#[actix_web::test]
async fn manual_update_requires_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(2, Role::Sales);
    let req = TestRequest::post().uri("/api/payment/manual-update?order_id=ORD-1&transaction_status=settlement");
    let configure = configure_with(MockShopDb::new(), idle_reconciler(), idle_provider(), options(true));
    let (status, _) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn manual_update_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockShopDb::new();
    ledger.expect_fetch_transaction().returning(|_| Ok(None));
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::post().uri("/api/payment/manual-update?order_id=ORD-9&transaction_status=settlement");
    let configure = configure_with(ledger, idle_reconciler(), idle_provider(), options(true));
    let (status, _) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn manual_settlement() {
    let _ = env_logger::try_init().ok();
    let mut reconciler = MockShopDb::new();
    reconciler
        .expect_reconcile_payment_status()
        .withf(|oid, status, source| {
            oid.as_str() == "ORD-1" &&
                status.status_code == "settlement" &&
                status.provider_txn_id.as_deref() == Some("manual-ORD-1") &&
                status.gross_amount == Some(Money::from_units(100_000)) &&
                *source == StatusSource::Manual
        })
        .times(1)
        .returning(|_, _, _| Ok(reconciled("ORD-1", TransactionStatus::Pending, TransactionStatus::Paid)));
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::post().uri("/api/payment/manual-update?order_id=ORD-1&transaction_status=Settlement");
    let configure = configure_with(ledger_with_order(7), reconciler, idle_provider(), options(true));
    let (status, body) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::OK);
    let res: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["status"], "success");
    assert_eq!(res["transaction_id"], 11);
    assert_eq!(res["order_id"], "ORD-1");
    assert_eq!(res["result"]["new_status"], "paid");
    assert_eq!(res["result"]["stock_decremented"], true);
}

//----------------------------------------------   Check status  ----------------------------------------------------

#[actix_web::test]
async fn check_status_reconciles_with_provider() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_query_status().times(1).returning(|_| {
        let status = ProviderStatus::new("settlement").with_provider_txn_id("abc");
        Ok(Some(status.with_gross_amount(Money::from_units(100_000))))
    });
    let mut reconciler = MockShopDb::new();
    reconciler
        .expect_reconcile_payment_status()
        .withf(|_, status, source| status.provider_txn_id.as_deref() == Some("abc") && *source == StatusSource::Poll)
        .times(1)
        .returning(|_, _, _| Ok(reconciled("ORD-1", TransactionStatus::Pending, TransactionStatus::Paid)));
    let token = issue_token(7, Role::Customer);
    let req = TestRequest::get().uri("/api/payment/check-status/ORD-1");
    let configure = configure_with(ledger_with_order(7), reconciler, provider, options(false));
    let (status, body) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::OK);
    let res: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["status"], "success");
    assert_eq!(res["order_id"], "ORD-1");
    assert_eq!(res["transaction_status"], "settlement");
}

#[actix_web::test]
async fn check_status_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, Role::Customer);
    let req = TestRequest::get().uri("/api/payment/check-status/ORD-1");
    let configure = configure_with(ledger_with_order(8), idle_reconciler(), idle_provider(), options(false));
    let (status, _) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn check_status_for_unknown_transaction() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockShopDb::new();
    ledger.expect_fetch_transaction().returning(|_| Ok(None));
    let token = issue_token(1, Role::Sales);
    let req = TestRequest::get().uri("/api/payment/check-status/ORD-1");
    let configure = configure_with(ledger, idle_reconciler(), idle_provider(), options(false));
    let (status, _) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn check_status_provider_does_not_know_order() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_query_status().returning(|_| Ok(None));
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::get().uri("/api/payment/check-status/ORD-1");
    let configure = configure_with(ledger_with_order(7), idle_reconciler(), provider, options(false));
    let (status, body) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Midtrans has no payment"));
}

#[actix_web::test]
async fn check_status_provider_unavailable() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_query_status().returning(|_| Err(ProviderError::Unavailable("503 Service Unavailable".into())));
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::get().uri("/api/payment/check-status/ORD-1");
    let configure = configure_with(ledger_with_order(7), idle_reconciler(), provider, options(false));
    let (status, _) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn check_status_provider_timeout() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::get().uri("/api/payment/check-status/ORD-1");
    let provider = SlowProvider(Duration::from_secs(5));
    let configure = configure_with(ledger_with_order(7), idle_reconciler(), provider, options(false));
    let (status, body) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.contains("did not respond"));
}

#[actix_web::test]
async fn check_status_order_vanished_during_reconcile() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_query_status().returning(|_| Ok(Some(ProviderStatus::new("pending"))));
    let mut reconciler = MockShopDb::new();
    reconciler
        .expect_reconcile_payment_status()
        .returning(|oid, _, _| Ok(ReconcileOutcome::UnknownOrder { order_id: OrderId::from(oid.as_str()) }));
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::get().uri("/api/payment/check-status/ORD-1");
    let configure = configure_with(ledger_with_order(7), reconciler, provider, options(false));
    let (status, _) = api_request(req, &token, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
