use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use shop_payment_engine::{
    db_types::{OrderId, OutcomeClass, Transaction, TransactionStatus},
    ReconcileOutcome,
    ReconcileResult,
};
use spg_common::Money;

use crate::{
    auth::{Role, TokenIssuer, TokenValidator},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

// Only ever used to sign tokens in these tests
const TEST_JWT_SECRET: &str = "endpoint-tests-do-not-use-this-secret-anywhere-else";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(user_id: i64, role: Role) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user_id, role, None).expect("Failed to sign token")
}

pub fn sample_transaction(order_id: &str, customer_id: i64, status: TransactionStatus) -> Transaction {
    let created = Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap();
    Transaction {
        id: 11,
        order_id: OrderId::from(order_id),
        customer_id,
        product_id: Some(42),
        quantity: 2,
        total_amount: Money::from_units(100_000),
        status,
        payment_method: Some("bank_transfer".into()),
        midtrans_transaction_id: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn reconciled(order_id: &str, previous: TransactionStatus, new: TransactionStatus) -> ReconcileOutcome {
    ReconcileOutcome::Reconciled(ReconcileResult {
        transaction_id: 11,
        order_id: OrderId::from(order_id),
        outcome: if new == TransactionStatus::Paid { OutcomeClass::Settled } else { OutcomeClass::Failed },
        previous_status: previous,
        new_status: new,
        stock_decremented: previous != TransactionStatus::Paid && new == TransactionStatus::Paid,
        duplicate_event: false,
        warnings: vec![],
    })
}

/// Sends the request through an `/api` scope guarded by the bearer token middleware, as the server does.
///
/// Errors raised by middleware come back from the service as `Err`; they are converted to `(status, message)` too, so
/// tests see the same thing a client would.
pub async fn api_request<F>(req: TestRequest, token: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = if token.is_empty() { req } else { req.insert_header(("Authorization", format!("Bearer {token}"))) };
    let validator = TokenValidator::new(&get_auth_config());
    let app = App::new().service(web::scope("/api").wrap(JwtMiddlewareFactory::new(validator)).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    into_parts(test::try_call_service(&service, req.to_request()).await).await
}

/// Sends the request to the unauthenticated webhook scope
pub async fn webhook_request<F>(body: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::post()
        .uri("/api/payment/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    let app = App::new().service(web::scope("/api/payment/webhook").configure(configure));
    let service = test::init_service(app).await;
    debug!("Making webhook request");
    into_parts(test::try_call_service(&service, req.to_request()).await).await
}

async fn into_parts<B: MessageBody>(res: Result<ServiceResponse<B>, actix_web::Error>) -> (StatusCode, String) {
    match res {
        Ok(res) => {
            let status = res.status();
            let body = test::try_read_body(res).await.map(|b| String::from_utf8_lossy(&b).into_owned());
            (status, body.unwrap_or_else(|_| "<unreadable body>".into()))
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}
