use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use shop_payment_engine::{
    db_types::TransactionStatus,
    traits::LedgerError,
    LedgerApi,
};
use spg_common::Money;

use super::{
    helpers::{api_request, issue_token, sample_transaction},
    mocks::MockShopDb,
};
use crate::{
    auth::Role,
    routes::{CreateTransactionRoute, TransactionByIdRoute, TransactionsRoute},
};

fn configure_with(db: MockShopDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(LedgerApi::new(db)))
            .service(CreateTransactionRoute::<MockShopDb>::new())
            .service(TransactionsRoute::<MockShopDb>::new())
            .service(TransactionByIdRoute::<MockShopDb>::new());
    }
}

#[actix_web::test]
async fn no_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_transactions().never();
    let (status, body) = api_request(TestRequest::get().uri("/api/transactions"), "", configure_with(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No bearer token was provided"));
}

#[actix_web::test]
async fn invalid_token_signature() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_transactions().never();
    let mut token = issue_token(7, Role::Customer);
    let n = token.len();
    token.replace_range(n - 10..n - 5, "AAAAA");
    let (status, _) = api_request(TestRequest::get().uri("/api/transactions"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn customers_only_see_their_own_transactions() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_transactions()
        .withf(|q| q.customer_id == Some(7) && q.statuses == vec![TransactionStatus::Paid] && q.limit == 5)
        .times(1)
        .returning(|_| Ok(vec![sample_transaction("ORD-1", 7, TransactionStatus::Paid)]));
    let token = issue_token(7, Role::Customer);
    let req = TestRequest::get().uri("/api/transactions?status=paid&limit=5");
    let (status, body) = api_request(req, &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let txs: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(txs[0]["order_id"], "ORD-1");
    assert_eq!(txs[0]["total_amount"], "100000.00");
    assert_eq!(txs[0]["status"], "paid");
}

#[actix_web::test]
async fn staff_see_all_transactions() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_transactions().withf(|q| q.customer_id.is_none() && q.offset == 20).times(1).returning(|_| {
        Ok(vec![
            sample_transaction("ORD-1", 7, TransactionStatus::Paid),
            sample_transaction("ORD-2", 8, TransactionStatus::Pending),
        ])
    });
    let token = issue_token(1, Role::Sales);
    let (status, body) =
        api_request(TestRequest::get().uri("/api/transactions?skip=20"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let txs: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(txs.as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn fetch_own_transaction() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_transaction()
        .withf(|oid| oid.as_str() == "ORD-1")
        .returning(|_| Ok(Some(sample_transaction("ORD-1", 7, TransactionStatus::Pending))));
    let token = issue_token(7, Role::Customer);
    let (status, body) =
        api_request(TestRequest::get().uri("/api/transactions/ORD-1"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""order_id":"ORD-1""#));
}

#[actix_web::test]
async fn fetch_another_customers_transaction() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_transaction().returning(|_| Ok(Some(sample_transaction("ORD-1", 8, TransactionStatus::Paid))));
    let token = issue_token(7, Role::Customer);
    let (status, body) =
        api_request(TestRequest::get().uri("/api/transactions/ORD-1"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("belongs to another customer"));
}

#[actix_web::test]
async fn fetch_missing_transaction() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_fetch_transaction().returning(|_| Ok(None));
    let token = issue_token(1, Role::Admin);
    let (status, _) = api_request(TestRequest::get().uri("/api/transactions/ORD-X"), &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn customer_checkout_is_for_themselves() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_insert_transaction()
        .withf(|t| {
            t.customer_id == 7 &&
                t.product_id == Some(42) &&
                t.quantity == 2 &&
                t.total_amount == Money::from_units(100_000)
        })
        .times(1)
        .returning(|t| Ok(sample_transaction(t.order_id.as_str(), t.customer_id, TransactionStatus::Pending)));
    let token = issue_token(7, Role::Customer);
    let req = TestRequest::post().uri("/api/transactions").set_json(serde_json::json!({
        "order_id": "ORD-1",
        "customer_id": 99,
        "product_id": 42,
        "quantity": 2,
        "total_amount": "100000.00"
    }));
    let (status, body) = api_request(req, &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""status":"pending""#));
}

#[actix_web::test]
async fn staff_checkout_requires_a_customer() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_insert_transaction().never();
    let token = issue_token(1, Role::Sales);
    let req = TestRequest::post()
        .uri("/api/transactions")
        .set_json(serde_json::json!({"order_id": "ORD-1", "total_amount": 150000}));
    let (status, body) = api_request(req, &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("customer_id is required"));
}

#[actix_web::test]
async fn checkout_with_insufficient_stock() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_insert_transaction()
        .returning(|_| Err(LedgerError::InsufficientStock { product_id: 42, available: 1, requested: 2 }));
    let token = issue_token(7, Role::Customer);
    let req = TestRequest::post().uri("/api/transactions").set_json(serde_json::json!({
        "order_id": "ORD-1", "product_id": 42, "quantity": 2, "total_amount": "100000.00"
    }));
    let (status, body) = api_request(req, &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Insufficient stock. Available: 1, Requested: 2"));
}

#[actix_web::test]
async fn checkout_for_missing_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_insert_transaction().returning(|_| Err(LedgerError::ProductNotFound(42)));
    let token = issue_token(7, Role::Customer);
    let req = TestRequest::post().uri("/api/transactions").set_json(serde_json::json!({
        "order_id": "ORD-1", "product_id": 42, "total_amount": "50000.00"
    }));
    let (status, _) = api_request(req, &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn duplicate_checkout() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDb::new();
    db.expect_insert_transaction().returning(|t| Err(LedgerError::DuplicateOrder(t.order_id)));
    let token = issue_token(7, Role::Customer);
    let req = TestRequest::post()
        .uri("/api/transactions")
        .set_json(serde_json::json!({"order_id": "ORD-1", "total_amount": "50000.00"}));
    let (status, body) = api_request(req, &token, configure_with(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("ORD-1"));
}
