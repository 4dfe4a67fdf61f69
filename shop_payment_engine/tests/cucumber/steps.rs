use cucumber::{then, when};
use shop_payment_engine::db_types::{NewTransaction, OrderId, ProviderStatus, StatusSource, TransactionStatus};
use spg_common::Money;

use crate::cucumber::LedgerWorld;

#[when(expr = "customer {int} checks out order {word} for {int} of product {int}")]
async fn checkout(world: &mut LedgerWorld, customer_id: i64, order_id: String, quantity: i64, product_id: i64) {
    let product = world.ledger().product(product_id).await.expect("Error fetching product").expect("No such product");
    let tx = NewTransaction::new(OrderId::from(order_id), customer_id, product.price * quantity)
        .with_product(product_id, quantity);
    world.ledger().create_transaction(tx).await.expect("Error creating transaction");
}

#[when(expr = "customer {int} checks out custom order {word} for {int}")]
async fn checkout_custom(world: &mut LedgerWorld, customer_id: i64, order_id: String, amount: i64) {
    let tx = NewTransaction::new(OrderId::from(order_id), customer_id, Money::from_units(amount));
    world.ledger().create_transaction(tx).await.expect("Error creating transaction");
}

#[when(expr = "the {word} reports {word} for order {word}")]
async fn provider_reports(world: &mut LedgerWorld, source: String, status_code: String, order_id: String) {
    let source = match source.as_str() {
        "webhook" => StatusSource::Webhook,
        "operator" => StatusSource::Manual,
        "poller" => StatusSource::Poll,
        s => panic!("Unknown trigger: {s}"),
    };
    let status = ProviderStatus::new(status_code).with_provider_txn_id(format!("mt-{order_id}"));
    let outcome =
        world.reconciler().reconcile(&OrderId::from(order_id), &status, source).await.expect("Error reconciling");
    world.last_outcome = Some(outcome);
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut LedgerWorld, order_id: String, status: String) {
    let expected = status.parse::<TransactionStatus>().expect("Not a transaction status");
    let tx = world
        .ledger()
        .transaction(&OrderId::from(order_id))
        .await
        .expect("Error fetching transaction")
        .expect("Transaction does not exist");
    assert_eq!(tx.status, expected);
}

#[then(expr = "product {int} has {int} in stock")]
async fn product_stock(world: &mut LedgerWorld, product_id: i64, stock: i64) {
    let product = world.ledger().product(product_id).await.expect("Error fetching product").expect("No such product");
    assert_eq!(product.stock, stock);
}

#[then("the order was unknown")]
async fn order_was_unknown(world: &mut LedgerWorld) {
    assert!(world.last_outcome().is_unknown_order());
}

#[then(expr = "the last report took stock: {word}")]
async fn stock_taken(world: &mut LedgerWorld, taken: String) {
    let expected = taken == "yes";
    let result = world.last_outcome().result().expect("Order was unknown");
    assert_eq!(result.stock_decremented, expected);
}

#[then(expr = "the last report raised {int} warning(s)")]
async fn warning_count(world: &mut LedgerWorld, count: usize) {
    let result = world.last_outcome().result().expect("Order was unknown");
    assert_eq!(result.warnings.len(), count);
}

#[then(expr = "order {word} has {int} payment event(s)")]
async fn payment_events(world: &mut LedgerWorld, order_id: String, count: usize) {
    let events = world.ledger().payment_history(&OrderId::from(order_id)).await.expect("Error fetching events");
    assert_eq!(events.len(), count);
}

#[then(expr = "total earnings are {int} from {int} paid order(s)")]
async fn earnings(world: &mut LedgerWorld, total: i64, paid: i64) {
    let summary = world.ledger().earnings().await.expect("Error fetching earnings");
    assert_eq!(summary.total_earnings, Money::from_units(total));
    assert_eq!(summary.paid_count, paid);
}
