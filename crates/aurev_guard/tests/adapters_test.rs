//! Integration tests against stub sibling agents
//!
//! Each test starts throwaway axum servers standing in for the scorer,
//! orchestrator and payment agent, and drives the API through them.

use aurev_guard::adapters::{BlockfrostClient, OrchestratorClient};
use aurev_guard::config::{AgentEndpoints, BlockfrostSettings};
use aurev_guard::domain::score_address;
use aurev_guard::pipeline::ChainDataSource;
use aurev_guard::{Error, GuardConfig, GuardServer};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const ADDRESS: &str = "addr_test1qz2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3jcu5d8ps7zex2k2xt3uqxgjqnnj83ws8lhrn648jjxtwq2ytjqp";
const UNREACHABLE: &str = "http://127.0.0.1:1";

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Orchestrator stub. Fails the first `failures` route calls with a 503.
#[derive(Clone)]
struct Orchestrator {
    calls: Arc<AtomicUsize>,
    failures: usize,
}

async fn orchestrator_route(
    State(stub): State<Orchestrator>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let call = stub.calls.fetch_add(1, Ordering::SeqCst);
    if call < stub.failures {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "warming up" })),
        );
    }
    let correlation = headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let risk = body["payload"]["decision"]["risk_score"].as_f64().unwrap_or(0.0);
    let decision = if risk > 80.0 { "rejected" } else { "approved" };
    match body["workflow"].as_str() {
        Some("settle") => (
            StatusCode::OK,
            Json(json!({
                "status": "valid",
                "payment_id": body["payload"]["payment_id"],
                "decision": decision,
                "correlation": correlation,
            })),
        ),
        Some("unknown") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unknown workflow" })),
        ),
        _ => (
            StatusCode::OK,
            Json(json!({ "echo": body["payload"], "correlation": correlation })),
        ),
    }
}

async fn spawn_orchestrator(failures: usize) -> (String, Arc<AtomicUsize>) {
    let stub = Orchestrator {
        calls: Arc::new(AtomicUsize::new(0)),
        failures,
    };
    let calls = stub.calls.clone();
    let app = Router::new()
        .route("/masumi/route", post(orchestrator_route))
        .route("/masumi/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(
            "/masumi/agents",
            get(|| async { Json(json!({ "agents": ["ai-model", "payment"] })) }),
        )
        .with_state(stub);
    (serve(app).await, calls)
}

async fn spawn_scorer() -> String {
    let app = Router::new()
        .route(
            "/ai/score",
            post(|Json(body): Json<Value>| async move {
                let address = body["address"].as_str().unwrap_or_default().to_string();
                Json(score_address(&address))
            }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }));
    serve(app).await
}

async fn spawn_payment_agent() -> String {
    let app = Router::new()
        .route(
            "/validate_settle",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "status": "valid",
                    "transaction_id": body["transaction_id"],
                    "checked_features": body["features"],
                }))
            }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }));
    serve(app).await
}

fn endpoints(orchestrator_url: &str) -> AgentEndpoints {
    AgentEndpoints {
        ai_stub_url: UNREACHABLE.to_string(),
        ai_agent_url: UNREACHABLE.to_string(),
        payment_agent_url: UNREACHABLE.to_string(),
        orchestrator_url: orchestrator_url.to_string(),
        orchestrator_retries: 3,
        orchestrator_backoff_ms: 1,
        health_timeout_ms: 500,
        ..Default::default()
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_route_retries_transient_failures() {
    let (url, calls) = spawn_orchestrator(2).await;
    let client = OrchestratorClient::new(&endpoints(&url));

    let routed = client.route("custom", json!({ "k": 1 })).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(routed.workflow, "custom");
    assert!(routed.correlation_id.starts_with("corr-"));
    assert_eq!(routed.data["echo"]["k"], 1);
    assert_eq!(routed.data["correlation"], routed.correlation_id.as_str());
}

#[tokio::test]
async fn test_route_gives_up_after_retries() {
    let (url, calls) = spawn_orchestrator(10).await;
    let client = OrchestratorClient::new(&endpoints(&url));

    let err = client.route("custom", json!({})).await.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(err, Error::Upstream { .. }));
    assert!(err.to_string().contains("Failed to route workflow 'custom'"));
}

#[tokio::test]
async fn test_route_does_not_retry_client_rejections() {
    let (url, calls) = spawn_orchestrator(0).await;
    let client = OrchestratorClient::new(&endpoints(&url));

    assert!(client.route("unknown", json!({})).await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scan_with_live_scorer() {
    let scorer = spawn_scorer().await;
    let agents = AgentEndpoints {
        ai_stub_url: scorer,
        ..endpoints(UNREACHABLE)
    };
    let app = GuardServer::new(GuardConfig::for_tests().with_agents(agents)).build_router();

    let (status, body) = send(&app, "POST", "/scan/address", Some(json!({ "address": ADDRESS }))).await;
    assert_eq!(status, StatusCode::OK);
    let expected = score_address(ADDRESS);
    assert_eq!(body["fallback"], false);
    assert_eq!(body["riskScore"], expected.risk_score);
    assert_eq!(body["explanation"], expected.explanation.as_str());
    assert_eq!(body["modelHash"], expected.model_hash.as_str());
}

#[tokio::test]
async fn test_orchestrator_endpoints() {
    let (url, _) = spawn_orchestrator(0).await;
    let app = GuardServer::new(GuardConfig::for_tests().with_agents(endpoints(&url))).build_router();

    let (status, agents) = send(&app, "GET", "/orchestrator/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agents["data"]["agents"][0], "ai-model");

    let (status, routed) = send(
        &app,
        "POST",
        "/orchestrator/route",
        Some(json!({ "workflow": "ai_predict", "payload": { "address": ADDRESS } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(routed["workflow"], "ai_predict");
    assert_eq!(routed["data"]["echo"]["address"], ADDRESS);
    assert!(routed["correlationId"].as_str().unwrap().starts_with("corr-"));

    let (status, _) = send(&app, "POST", "/orchestrator/route", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orchestrator_unreachable_is_bad_gateway() {
    let app = GuardServer::new(GuardConfig::for_tests().with_agents(endpoints(UNREACHABLE))).build_router();
    let (status, body) = send(&app, "GET", "/orchestrator/agents", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_settle_direct_and_with_compliance() {
    let (orchestrator, _) = spawn_orchestrator(0).await;
    let payment = spawn_payment_agent().await;
    let agents = AgentEndpoints {
        payment_agent_url: payment,
        ..endpoints(&orchestrator)
    };
    let app = GuardServer::new(GuardConfig::for_tests().with_agents(agents)).build_router();

    let (status, direct) = send(
        &app,
        "POST",
        "/agent/settle",
        Some(json!({ "transactionId": "tx-1", "features": { "amount": 5 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(direct["data"]["paymentStatus"], "valid");
    assert_eq!(direct["data"]["isValid"], true);
    assert_eq!(direct["data"]["paymentId"], "tx-1");
    assert_eq!(direct["data"]["checkedFeatures"]["amount"], 5);

    let (status, compliance) = send(
        &app,
        "POST",
        "/agent/settle",
        Some(json!({ "transactionId": "tx-2", "riskScore": 91 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(compliance["data"]["success"], true);
    assert_eq!(compliance["data"]["complianceDecision"], "rejected");
    assert_eq!(compliance["data"]["paymentId"], "tx-2");

    let (status, _) = send(&app, "POST", "/agent/settle", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settle_fallbacks_when_agents_are_down() {
    let app = GuardServer::new(GuardConfig::for_tests().with_agents(endpoints(UNREACHABLE))).build_router();

    let (_, direct) = send(&app, "POST", "/agent/settle", Some(json!({ "transactionId": "tx-1" }))).await;
    assert_eq!(direct["data"]["paymentStatus"], "pending");
    assert_eq!(direct["data"]["fallback"], true);

    let (_, compliance) = send(
        &app,
        "POST",
        "/agent/settle",
        Some(json!({ "transactionId": "tx-1", "riskScore": 10 })),
    )
    .await;
    assert_eq!(compliance["data"]["success"], false);
    assert_eq!(compliance["data"]["complianceDecision"], "rejected");
    assert_eq!(compliance["data"]["fallback"], true);
}

#[tokio::test]
async fn test_services_health() {
    let (orchestrator, _) = spawn_orchestrator(0).await;
    let payment = spawn_payment_agent().await;
    let agents = AgentEndpoints {
        payment_agent_url: payment,
        ..endpoints(&orchestrator)
    };
    let app = GuardServer::new(GuardConfig::for_tests().with_agents(agents)).build_router();

    let (status, body) = send(&app, "GET", "/health/services", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allHealthy"], false);
    assert_eq!(body["services"]["orchestrator"]["healthy"], true);
    assert_eq!(body["services"]["payment"]["healthy"], true);
    assert_eq!(body["services"]["aiModel"]["healthy"], false);
}

const PAYMENT_ADDRESS: &str = "addr_test1qpaymentreceiver";

fn utxo(address: &str, lovelace: u64) -> Value {
    json!({
        "address": address,
        "amount": [
            { "unit": "lovelace", "quantity": lovelace.to_string() },
            { "unit": "asset1xyz", "quantity": "7" },
        ],
    })
}

fn has_project_id(headers: &HeaderMap) -> bool {
    headers.get("project_id").and_then(|v| v.to_str().ok()) == Some("previewTestKey")
}

/// Blockfrost stub. `tx_gone` is listed but has no detail.
async fn spawn_blockfrost() -> String {
    let app = Router::new()
        .route(
            "/addresses/{address}/transactions",
            get(|Path(address): Path<String>, headers: HeaderMap| async move {
                if !has_project_id(&headers) {
                    return (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" })));
                }
                if address != ADDRESS {
                    return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })));
                }
                (
                    StatusCode::OK,
                    Json(json!([
                        { "tx_hash": "tx_a", "tx_index": 0, "block_height": 201, "block_time": 1_700_000_600 },
                        { "tx_hash": "tx_b", "tx_index": 1, "block_height": 200, "block_time": 1_700_000_000 },
                        { "tx_hash": "tx_gone", "tx_index": 0, "block_height": 199, "block_time": 1_699_999_000 },
                    ])),
                )
            }),
        )
        .route(
            "/txs/{hash}",
            get(|Path(hash): Path<String>| async move {
                match hash.as_str() {
                    "tx_a" => (
                        StatusCode::OK,
                        Json(json!({ "hash": "tx_a", "block_height": 201, "block_time": 1_700_000_600, "fees": "174433", "size": 412 })),
                    ),
                    "tx_b" => (
                        StatusCode::OK,
                        Json(json!({ "hash": "tx_b", "block_height": 200, "block_time": 1_700_000_000, "fees": "168801", "size": 298 })),
                    ),
                    _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" }))),
                }
            }),
        )
        .route(
            "/txs/{hash}/utxos",
            get(|Path(hash): Path<String>| async move {
                let (inputs, outputs) = match hash.as_str() {
                    "tx_a" => (vec![utxo(ADDRESS, 9_000_000)], vec![utxo("addr_test1peer_a", 4_000_000)]),
                    "tx_b" => (vec![utxo(ADDRESS, 3_000_000)], vec![utxo("addr_test1peer_b", 2_500_000)]),
                    "pay_exact" => (vec![utxo(ADDRESS, 5_000_000)], vec![utxo(PAYMENT_ADDRESS, 2_000_000)]),
                    "pay_low" => (vec![utxo(ADDRESS, 5_000_000)], vec![utxo(PAYMENT_ADDRESS, 1_999_999)]),
                    "pay_elsewhere" => (vec![utxo(ADDRESS, 5_000_000)], vec![utxo("addr_test1someoneelse", 9_000_000)]),
                    _ => return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" }))),
                };
                (StatusCode::OK, Json(json!({ "hash": hash, "inputs": inputs, "outputs": outputs })))
            }),
        );
    serve(app).await
}

fn blockfrost_client(base_url: &str) -> BlockfrostClient {
    BlockfrostClient::new(BlockfrostSettings {
        api_key: Some("previewTestKey".to_string()),
        base_url: Some(base_url.to_string()),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_blockfrost_wallet_activity() {
    let client = blockfrost_client(&spawn_blockfrost().await);

    let activity = client.fetch_wallet_activity(ADDRESS, 10).await.unwrap();
    assert_eq!(activity.wallet_address, ADDRESS);
    assert_eq!(activity.transaction_count, 2);

    let hashes: Vec<&str> = activity.transactions.iter().map(|t| t.tx_hash.as_str()).collect();
    assert_eq!(hashes, ["tx_a", "tx_b"]);

    let tx = &activity.transactions[0];
    assert_eq!(tx.fees, 174_433);
    assert_eq!(tx.size, 412);
    assert_eq!(tx.block_height, 201);
    assert_eq!(tx.block_time, 1_700_000_600);
    assert_eq!(tx.value(), 4_000_000);
    assert_eq!(tx.counterparty(ADDRESS), "addr_test1peer_a");
}

#[tokio::test]
async fn test_blockfrost_unknown_address_is_empty() {
    let client = blockfrost_client(&spawn_blockfrost().await);
    let activity = client
        .fetch_wallet_activity("addr_test1neverused", 10)
        .await
        .unwrap();
    assert_eq!(activity.transaction_count, 0);
    assert!(activity.transactions.is_empty());
}

#[tokio::test]
async fn test_blockfrost_rejected_key_is_upstream_error() {
    let url = spawn_blockfrost().await;
    let client = BlockfrostClient::new(BlockfrostSettings {
        api_key: Some("previewWrongKey".to_string()),
        base_url: Some(url),
        ..Default::default()
    });
    let err = client.fetch_wallet_activity(ADDRESS, 10).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamStatus { status: 403, .. }));
}

#[tokio::test]
async fn test_blockfrost_payment_verification() {
    let client = blockfrost_client(&spawn_blockfrost().await);

    assert!(client.verify_payment("pay_exact", 2_000_000, PAYMENT_ADDRESS).await.unwrap());
    assert!(!client.verify_payment("pay_low", 2_000_000, PAYMENT_ADDRESS).await.unwrap());
    assert!(!client.verify_payment("pay_elsewhere", 2_000_000, PAYMENT_ADDRESS).await.unwrap());
    assert!(!client.verify_payment("pay_missing", 2_000_000, PAYMENT_ADDRESS).await.unwrap());
}
