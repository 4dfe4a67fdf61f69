use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use shop_payment_engine::{
    db_types::{OrderId, Payment, PaymentEvent, StatusSource},
    traits::EarningsSummary,
    LedgerApi,
};
use spg_common::Money;

use super::{
    helpers::{api_request, issue_token},
    mocks::MockShopDb,
};
use crate::{
    auth::Role,
    routes::{EarningsRoute, PaymentByIdRoute, PaymentsRoute},
};

fn configure_with(db: MockShopDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(LedgerApi::new(db)))
            .service(PaymentsRoute::<MockShopDb>::new())
            .service(PaymentByIdRoute::<MockShopDb>::new())
            .service(EarningsRoute::<MockShopDb>::new());
    }
}

fn sample_payment() -> Payment {
    let at = Utc.with_ymd_and_hms(2024, 10, 1, 12, 30, 0).unwrap();
    Payment {
        id: 3,
        transaction_id: 11,
        order_id: OrderId::from("ORD-1"),
        gross_amount: Money::from_units(100_000),
        payment_type: Some("bank_transfer".into()),
        transaction_status: "settlement".into(),
        fraud_status: Some("accept".into()),
        transaction_time: Some(at),
        status_message: None,
        midtrans_transaction_id: Some("513f1f01".into()),
        created_at: at,
        updated_at: at,
    }
}

fn sample_event(id: i64, status_code: &str) -> PaymentEvent {
    let at = Utc.with_ymd_and_hms(2024, 10, 1, 12, 30, 0).unwrap();
    PaymentEvent {
        id,
        transaction_id: 11,
        order_id: OrderId::from("ORD-1"),
        content_hash: format!("{id:064x}"),
        source: StatusSource::Webhook,
        status_code: status_code.into(),
        provider_txn_id: Some("513f1f01".into()),
        gross_amount: Some(Money::from_units(100_000)),
        payment_type: None,
        fraud_status: None,
        status_message: None,
        occurred_at: Some(at),
        received_at: at,
    }
}

#[actix_web::test]
async fn customers_cannot_list_payments() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_payments().never();
    let token = issue_token(7, Role::Customer);
    let (status, body) = api_request(TestRequest::get().uri("/api/payments"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("admin, sales"));
}

#[actix_web::test]
async fn sales_can_list_payments() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_payments()
        .withf(|q| q.transaction_status.as_deref() == Some("settlement") && q.offset == 0)
        .times(1)
        .returning(|_| Ok(vec![sample_payment()]));
    let token = issue_token(2, Role::Sales);
    let req = TestRequest::get().uri("/api/payments?transaction_status=settlement");
    let (status, body) = api_request(req, &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let payments: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payments[0]["gross_amount"], "100000.00");
    assert_eq!(payments[0]["transaction_status"], "settlement");
}

#[actix_web::test]
async fn payment_detail_includes_history() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_payment().returning(|_| Ok(Some(sample_payment())));
    db.expect_fetch_payment_events()
        .withf(|oid| oid.as_str() == "ORD-1")
        .returning(|_| Ok(vec![sample_event(1, "pending"), sample_event(2, "settlement")]));
    let token = issue_token(1, Role::Admin);
    let (status, body) = api_request(TestRequest::get().uri("/api/payments/ORD-1"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let detail: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(detail["payment"]["order_id"], "ORD-1");
    assert_eq!(detail["events"][0]["status_code"], "pending");
    assert_eq!(detail["events"][1]["source"], "webhook");
}

#[actix_web::test]
async fn payment_detail_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_payment().returning(|_| Ok(None));
    db.expect_fetch_payment_events().never();
    let token = issue_token(1, Role::Admin);
    let (status, _) = api_request(TestRequest::get().uri("/api/payments/ORD-9"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn earnings_summary() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_earnings().times(1).returning(|| {
        Ok(EarningsSummary {
            total_earnings: Money::from_units(250_000),
            paid_count: 2,
            pending_count: 1,
            failed_count: 3,
        })
    });
    let token = issue_token(1, Role::Admin);
    let (status, body) =
        api_request(TestRequest::get().uri("/api/dashboard/earnings"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"total_earnings":"250000.00","paid_count":2,"pending_count":1,"failed_count":3}"#);
}

#[actix_web::test]
async fn customers_cannot_see_earnings() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_earnings().never();
    let token = issue_token(7, Role::Customer);
    let (status, _) = api_request(TestRequest::get().uri("/api/dashboard/earnings"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
