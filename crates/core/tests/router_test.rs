//! Router tests: operation dispatch, argument validation, capability
//! negotiation, and a full round trip over the bus.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use lnb::testing::{MockConnector, paired_bus, session_with_connectors, test_account};
use lnb::{Connector, Router};
use lnb_runtime::RpcHandler;
use serde_json::{Value, json};

struct Fixture {
    router: Router,
    connector: Arc<MockConnector>,
}

async fn selected_fixture() -> Fixture {
    let connector = MockConnector::new("alice");
    connector.set_balance(500, None);
    let session = session_with_connectors(vec![connector.clone()]);
    session.add_account(test_account("acc1", "Alice"));
    session.select_account("acc1").await.unwrap();
    Fixture {
        router: Router::new(session),
        connector,
    }
}

#[tokio::test]
async fn unknown_operation_resolves_with_error_envelope() {
    let fx = selected_fixture().await;
    let envelope = fx.router.handle("frobnicate", Value::Null).await;
    assert_eq!(
        envelope.error.as_deref(),
        Some("Unknown operation: frobnicate")
    );
}

#[tokio::test]
async fn operations_without_selection_report_no_current_account() {
    let session = session_with_connectors(vec![]);
    let router = Router::new(session);

    let envelope = router.handle("getBalance", Value::Null).await;
    assert_eq!(envelope.error.as_deref(), Some("No current account set"));
}

#[tokio::test]
async fn account_info_round_trips_through_router() {
    let fx = selected_fixture().await;
    let envelope = fx.router.handle("accountInfo", Value::Null).await;
    let data = envelope.data.expect("success envelope");
    assert_eq!(data["currentAccountId"], "acc1");
    assert_eq!(data["balance"]["balance"], 500);
    assert_eq!(data["balance"]["currency"], "BTC");
}

#[tokio::test]
async fn make_invoice_validation_failure_is_an_envelope_error() {
    let fx = selected_fixture().await;
    let envelope = fx
        .router
        .handle("makeInvoice", json!({"amount": 0, "memo": "zero"}))
        .await;
    let error = envelope.error.expect("error envelope");
    assert!(error.contains("amount must be positive"), "got: {error}");
}

#[tokio::test]
async fn make_invoice_success() {
    let fx = selected_fixture().await;
    let envelope = fx
        .router
        .handle("makeInvoice", json!({"amount": 21, "memo": "coffee"}))
        .await;
    let data = envelope.data.expect("success envelope");
    assert!(data["paymentRequest"].as_str().unwrap().starts_with("lnbc"));
    assert!(data["rHash"].is_string());
}

#[tokio::test]
async fn malformed_arguments_become_validation_errors() {
    let fx = selected_fixture().await;
    let envelope = fx
        .router
        .handle("makeInvoice", json!({"amount": "lots"}))
        .await;
    let error = envelope.error.expect("error envelope");
    assert!(error.starts_with("Invalid argument"), "got: {error}");
}

#[tokio::test]
async fn request_method_rejects_unadvertised_methods_before_dispatch() {
    let fx = selected_fixture().await;
    let envelope = fx
        .router
        .handle("requestMethod", json!({"method": "getroute"}))
        .await;
    assert_eq!(
        envelope.error.as_deref(),
        Some("Unsupported method: getroute")
    );
    // Rejection happens at the negotiation layer, not inside the connector.
    assert_eq!(fx.connector.counts.call.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unadvertised_connector_call_is_classified_as_unsupported() {
    let connector = MockConnector::new("alice");
    let err = connector.call("getroute", Value::Null).await.unwrap_err();
    assert!(err.is_unsupported_method(), "got: {err:?}");
}

#[tokio::test]
async fn request_method_dispatches_advertised_methods() {
    let fx = selected_fixture().await;
    fx.connector.advertise(&["getroute"]);

    let envelope = fx
        .router
        .handle(
            "requestMethod",
            json!({"method": "getroute", "args": {"dest": "02abc"}}),
        )
        .await;
    let data = envelope.data.expect("success envelope");
    assert_eq!(data["method"], "getroute");
    assert_eq!(data["args"]["dest"], "02abc");
    assert_eq!(fx.connector.counts.call.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn account_management_operations() {
    let fx = selected_fixture().await;

    let envelope = fx.router.handle("getAccounts", Value::Null).await;
    let accounts = envelope.data.expect("success envelope");
    assert_eq!(accounts.as_array().unwrap().len(), 1);
    assert_eq!(accounts[0]["id"], "acc1");

    let envelope = fx
        .router
        .handle("editAccount", json!({"id": "acc1", "name": "Alicia"}))
        .await;
    assert_eq!(envelope.data.expect("success envelope")["name"], "Alicia");

    let envelope = fx
        .router
        .handle("removeAccount", json!({"id": "acc1"}))
        .await;
    let data = envelope.data.expect("success envelope");
    assert_eq!(data["removed"], "acc1");
    assert_eq!(data["wasCurrent"], true);
}

#[tokio::test]
async fn transactions_accept_absent_arguments() {
    let fx = selected_fixture().await;
    let envelope = fx.router.handle("getTransactions", Value::Null).await;
    let data = envelope.data.expect("success envelope");
    assert_eq!(data["transactions"], json!([]));
}

#[tokio::test]
async fn status_round_trips_over_the_bus() {
    let connector = MockConnector::new("alice");
    let session = session_with_connectors(vec![connector]);
    session.add_account(test_account("acc1", "Alice"));
    session.select_account("acc1").await.unwrap();

    let bus = paired_bus(Arc::new(Router::new(session)));
    let envelope = bus.request("status", Value::Null).await.unwrap();
    let status = envelope.data.expect("success envelope");
    assert_eq!(status["configured"], true);
    assert_eq!(status["unlocked"], true);
    assert_eq!(status["currentAccountId"], "acc1");

    let envelope = bus.request("lock", Value::Null).await.unwrap();
    assert_eq!(envelope.data, Some(json!(true)));

    let envelope = bus.request("unlock", Value::Null).await.unwrap();
    assert_eq!(
        envelope.data.expect("success envelope")["currentAccountId"],
        "acc1"
    );
}
