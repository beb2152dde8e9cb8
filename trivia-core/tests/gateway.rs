use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use trivia_core::storage::{MemoryStore, Storage, TransactionStore};
use trivia_core::{
    ChannelConfig, ErrorKind, GatewayConfig, PayHeroClient, PaymentError, PaymentGateway,
    PaymentResponse, PaymentService, PollerConfig, RequestBuilder, TransactionReference,
    TransactionStatus,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("trivia_core=debug")
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Default)]
struct Provider {
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Basic {}", general_purpose::STANDARD.encode("user:secret"));
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false)
}

async fn payments(
    State(provider): State<Provider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response();
    }

    let phone = body["phone_number"].as_str().unwrap_or_default().to_string();
    provider.bodies.lock().unwrap().push(body);

    if phone == "254700000000" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Insufficient float"})),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({"reference": "ref-1", "status": "QUEUED", "CheckoutRequestID": "ws_CO_1"})),
    )
        .into_response()
}

async fn withdraw(
    State(provider): State<Provider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response();
    }

    let amount = body["amount"].as_u64().unwrap_or_default();
    provider.bodies.lock().unwrap().push(body);

    if amount > 1000 {
        return (StatusCode::BAD_GATEWAY, "<html>upstream error</html>").into_response();
    }

    match amount {
        777 => {
            return (
                StatusCode::CREATED,
                Json(json!({"merchant_reference": "wd-7", "status": "PENDING", "success": true})),
            )
                .into_response()
        }
        778 => {
            return (
                StatusCode::CREATED,
                Json(json!({"merchant_reference": "wd-8", "status": null})),
            )
                .into_response()
        }
        _ => {}
    }

    (
        StatusCode::CREATED,
        Json(json!({"merchant_reference": "wd-1", "status": "QUEUED"})),
    )
        .into_response()
}

async fn transaction_status(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response();
    }

    match params.get("reference").map(String::as_str) {
        Some("ref-1") => Json(json!({"status": "SUCCESS"})).into_response(),
        Some("ref 2&x") => Json(json!({"status": "FAILED"})).into_response(),
        Some("weird") => Json(json!({"status": "PENDING"})).into_response(),
        Some("late") => Json(json!({"status": "TIMEOUT"})).into_response(),
        Some("broken") => (StatusCode::OK, "not json").into_response(),
        _ => (StatusCode::NOT_FOUND, "").into_response(),
    }
}

async fn spawn_provider() -> (String, Provider) {
    init_tracing();
    let provider = Provider::default();
    let app = Router::new()
        .route("/payments", post(payments))
        .route("/withdraw", post(withdraw))
        .route("/transaction-status", get(transaction_status))
        .with_state(provider.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), provider)
}

fn client(base_url: &str, password: &str) -> PayHeroClient {
    PayHeroClient::new(
        GatewayConfig::new("user", password)
            .with_base_url(base_url)
            .with_callback_url("https://trivia.example/callback"),
    )
    .unwrap()
}

async fn builder() -> RequestBuilder {
    let channels = ChannelConfig::load(Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    RequestBuilder::new(Arc::new(channels), "https://trivia.example/callback")
}

#[tokio::test]
async fn deposit_sends_provider_payload() {
    let (base_url, provider) = spawn_provider().await;
    let gateway = client(&base_url, "secret");
    let request = builder().await.deposit(20.0, "0712345678").unwrap();

    let receipt = gateway.initiate_deposit(&request).await.unwrap();
    assert_eq!(receipt.reference.as_str(), "ref-1");
    assert_eq!(receipt.status, TransactionStatus::Queued);
    assert_eq!(receipt.checkout_request_id.as_deref(), Some("ws_CO_1"));

    let body = provider.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["amount"], 20);
    assert_eq!(body["phone_number"], "254712345678");
    assert_eq!(body["channel_id"], "1487");
    assert_eq!(body["provider"], "m-pesa");
    assert_eq!(body["callback_url"], "https://trivia.example/callback");
    assert!(body["external_reference"]
        .as_str()
        .unwrap()
        .starts_with("trivia_"));
}

#[tokio::test]
async fn withdrawal_sends_b2c_payload() {
    let (base_url, provider) = spawn_provider().await;
    let gateway = client(&base_url, "secret");
    let request = builder().await.withdrawal(80.0, "0712345678").unwrap();

    let receipt = gateway.initiate_withdrawal(&request).await.unwrap();
    assert_eq!(receipt.merchant_reference.as_str(), "wd-1");

    let body = provider.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["network_code"], "63902");
    assert_eq!(body["channel"], "mobile");
    assert_eq!(body["payment_service"], "b2c");
    assert!(body["external_reference"]
        .as_str()
        .unwrap()
        .starts_with("trivia_withdraw_"));
}

#[tokio::test]
async fn accepted_withdrawal_with_unrecognized_status_is_queued() {
    let (base_url, _provider) = spawn_provider().await;
    let gateway = client(&base_url, "secret");
    let builder = builder().await;

    let receipt = gateway
        .initiate_withdrawal(&builder.withdrawal(777.0, "0712345678").unwrap())
        .await
        .unwrap();
    assert_eq!(receipt.merchant_reference.as_str(), "wd-7");
    assert_eq!(receipt.status, TransactionStatus::Queued);

    let receipt = gateway
        .initiate_withdrawal(&builder.withdrawal(778.0, "0712345678").unwrap())
        .await
        .unwrap();
    assert_eq!(receipt.merchant_reference.as_str(), "wd-8");
    assert_eq!(receipt.status, TransactionStatus::Queued);
}

#[tokio::test]
async fn provider_message_surfaces_on_rejection() {
    let (base_url, _provider) = spawn_provider().await;
    let gateway = client(&base_url, "secret");
    let request = builder().await.deposit(20.0, "0700000000").unwrap();

    let err = gateway.initiate_deposit(&request).await.unwrap_err();
    match err {
        PaymentError::GatewayRequestFailed { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Insufficient float");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn generic_message_when_body_unparsable() {
    let (base_url, _provider) = spawn_provider().await;
    let gateway = client(&base_url, "secret");
    let request = builder().await.withdrawal(5000.0, "0712345678").unwrap();

    let err = gateway.initiate_withdrawal(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GatewayRequestFailed);
    assert_eq!(err.to_string(), "Withdrawal initiation failed");
}

#[tokio::test]
async fn credentials_attached_to_every_call() {
    let (base_url, _provider) = spawn_provider().await;
    let gateway = client(&base_url, "wrong");
    let request = builder().await.deposit(20.0, "0712345678").unwrap();

    let err = gateway.initiate_deposit(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Unauthorized");

    let err = gateway.query_status(&"ref-1".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GatewayRequestFailed);
}

#[tokio::test]
async fn status_queries() {
    let (base_url, _provider) = spawn_provider().await;
    let gateway = client(&base_url, "secret");

    assert_eq!(
        gateway.query_status(&"ref-1".into()).await.unwrap(),
        TransactionStatus::Success
    );
    assert_eq!(
        gateway
            .query_status(&TransactionReference::new("ref 2&x"))
            .await
            .unwrap(),
        TransactionStatus::Failed
    );

    let err = gateway.query_status(&"weird".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);

    let err = gateway.query_status(&"late".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);

    let err = gateway.query_status(&"broken".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);

    let err = gateway.query_status(&"missing".into()).await.unwrap_err();
    assert_eq!(err.to_string(), "Status check failed (HTTP 404)");
}

#[tokio::test]
async fn unreachable_provider() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = client(&format!("http://{}/", addr), "secret");
    let request = builder().await.deposit(20.0, "0712345678").unwrap();

    let err = gateway.initiate_deposit(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GatewayUnreachable);

    let response = PaymentResponse::from(Err::<(), _>(err));
    assert!(!response.success);
    assert!(response.error.is_some());
}

#[tokio::test]
async fn service_end_to_end() {
    let (base_url, provider) = spawn_provider().await;
    let storage = Arc::new(Storage::in_memory().await.unwrap());
    let channels = ChannelConfig::load(Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    let service = PaymentService::new(
        Arc::new(client(&base_url, "secret")),
        Arc::new(channels),
        TransactionStore::new(storage),
        "https://trivia.example/callback",
        PollerConfig::default(),
    )
    .unwrap();

    let receipt = service.initiate_deposit(20.0, "0712345678").await.unwrap();
    assert_eq!(receipt.reference.as_str(), "ref-1");

    let status = service
        .check_transaction_status(&receipt.reference)
        .await
        .unwrap();
    assert_eq!(status, TransactionStatus::Success);

    let record = service.transaction(&receipt.reference).await.unwrap();
    assert_eq!(record.status, TransactionStatus::Success);
    assert_eq!(record.phone_number, "254712345678");

    let receipt = service.withdraw_to_mobile(777.0, "0712345678").await.unwrap();
    let record = service.transaction(&receipt.merchant_reference).await.unwrap();
    assert_eq!(record.status, TransactionStatus::Queued);
    assert_eq!(record.amount, 777);
    assert_eq!(provider.bodies.lock().unwrap().len(), 2);
}
