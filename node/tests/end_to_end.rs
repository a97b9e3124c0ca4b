//! Full-stack scenarios: real LMDB store, real Bot API and captcha clients
//! pointed at a local mock, driven through the HTTP router.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use spotgate_admission::AdmissionMode;
use spotgate_crypto::{
    derive_address, encode_signature, keypair_from_seed, sign_message, SignatureEncoding,
};
use spotgate_node::{GateConfig, GateNode};

const CHALLENGE: &str = "spotgate end-to-end";
const CHAT: &str = "-1009876";

#[derive(Default)]
struct Upstream {
    calls: Mutex<Vec<(String, String)>>,
    invite_error: Mutex<Option<&'static str>>,
    captcha_success: Mutex<bool>,
}

impl Upstream {
    fn calls_to(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn mock_api(State(upstream): State<Arc<Upstream>>, uri: Uri, body: Bytes) -> Response {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let text = String::from_utf8_lossy(&body).to_string();
    upstream.calls.lock().unwrap().push((method.clone(), text));

    match method.as_str() {
        "createChatInviteLink" => match *upstream.invite_error.lock().unwrap() {
            Some(description) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error_code": 400, "description": description })),
            )
                .into_response(),
            None => Json(json!({
                "ok": true,
                "result": { "invite_link": "https://t.me/+e2e", "member_limit": 1 }
            }))
            .into_response(),
        },
        "sendMessage" => Json(json!({ "ok": true, "result": { "message_id": 1 } })).into_response(),
        "siteverify" => {
            let success = *upstream.captcha_success.lock().unwrap();
            let codes: Vec<&str> = if success { vec![] } else { vec!["invalid-input-response"] };
            Json(json!({ "success": success, "error-codes": codes })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_upstream() -> (Arc<Upstream>, SocketAddr) {
    let upstream = Arc::new(Upstream::default());
    *upstream.captcha_success.lock().unwrap() = true;
    let app = Router::new()
        .fallback(mock_api)
        .with_state(Arc::clone(&upstream));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (upstream, addr)
}

fn config(dir: &std::path::Path, upstream: SocketAddr, mode: AdmissionMode) -> GateConfig {
    GateConfig {
        data_dir: dir.to_path_buf(),
        max_spots: 2,
        mode,
        challenge_message: CHALLENGE.to_string(),
        captcha_secret: Some("captcha-secret".into()),
        captcha_verify_url: format!("http://{upstream}/siteverify"),
        telegram_bot_token: Some("testtoken".into()),
        telegram_chat_id: Some(CHAT.into()),
        telegram_api_url: format!("http://{upstream}"),
        welcome_enabled: true,
        upstream_timeout_secs: 5,
        map_size_mb: 16,
        ..Default::default()
    }
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(path: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn spots() -> Request<Body> {
    Request::get("/spots").body(Body::empty()).unwrap()
}

fn wallet_join(seed: u8) -> Value {
    let kp = keypair_from_seed(&[seed; 32]);
    let sig = sign_message(CHALLENGE.as_bytes(), &kp.private);
    json!({
        "wallet": derive_address(&kp.public).to_string(),
        "signatureBase64": encode_signature(&sig, SignatureEncoding::Base64),
    })
}

#[tokio::test]
async fn identity_mode_admits_once_per_wallet() {
    let (upstream, addr) = start_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let node = GateNode::new(config(dir.path(), addr, AdmissionMode::Identity)).unwrap();
    let router = spotgate_rpc::router(node.rpc_state());

    let (status, body) = call(&router, post("/join", wallet_join(1))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "invite_link": "https://t.me/+e2e", "spots_remaining": 1 }));

    let invite_calls = upstream.calls_to("createChatInviteLink");
    assert_eq!(invite_calls.len(), 1);
    let params: Value = serde_json::from_str(&invite_calls[0]).unwrap();
    assert_eq!(params["member_limit"], 1);
    assert_eq!(params["chat_id"], CHAT);

    let (status, _) = call(&router, post("/join", wallet_join(1))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, usage) = call(&router, spots()).await;
    assert_eq!(usage, json!({ "max": 2, "used": 1, "remaining": 1 }));
}

#[tokio::test]
async fn anonymous_mode_fills_to_capacity() {
    let (upstream, addr) = start_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let node = GateNode::new(config(dir.path(), addr, AdmissionMode::Anonymous)).unwrap();
    let router = spotgate_rpc::router(node.rpc_state());
    let join = || post("/join", json!({ "captchaToken": "human" }));

    assert_eq!(call(&router, join()).await.0, StatusCode::OK);
    let (status, body) = call(&router, join()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spots_remaining"], 0);

    let (status, _) = call(&router, join()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let verify_calls = upstream.calls_to("siteverify");
    assert_eq!(verify_calls.len(), 2);
    assert!(verify_calls[0].contains("secret=captcha-secret"));
    assert!(verify_calls[0].contains("response=human"));
}

#[tokio::test]
async fn failed_captcha_is_forbidden() {
    let (upstream, addr) = start_upstream().await;
    *upstream.captcha_success.lock().unwrap() = false;
    let dir = tempfile::tempdir().unwrap();
    let node = GateNode::new(config(dir.path(), addr, AdmissionMode::Anonymous)).unwrap();
    let router = spotgate_rpc::router(node.rpc_state());

    let (status, body) = call(&router, post("/join", json!({ "captchaToken": "bot" }))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["details"]["error-codes"][0], "invalid-input-response");
    assert!(upstream.calls_to("createChatInviteLink").is_empty());
}

#[tokio::test]
async fn upstream_rejection_rolls_back() {
    let (upstream, addr) = start_upstream().await;
    *upstream.invite_error.lock().unwrap() = Some("Bad Request: chat not found");
    let dir = tempfile::tempdir().unwrap();
    let node = GateNode::new(config(dir.path(), addr, AdmissionMode::Identity)).unwrap();
    let router = spotgate_rpc::router(node.rpc_state());

    let (status, body) = call(&router, post("/join", wallet_join(3))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["telegram_error"], "Bad Request: chat not found");
    let (_, usage) = call(&router, spots()).await;
    assert_eq!(usage["used"], 0);

    // The same wallet may try again once the upstream recovers.
    *upstream.invite_error.lock().unwrap() = None;
    let (status, _) = call(&router, post("/join", wallet_join(3))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn records_survive_restart() {
    let (_upstream, addr) = start_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    {
        let node = GateNode::new(config(dir.path(), addr, AdmissionMode::Identity)).unwrap();
        let router = spotgate_rpc::router(node.rpc_state());
        assert_eq!(call(&router, post("/join", wallet_join(5))).await.0, StatusCode::OK);
    }

    let node = GateNode::new(config(dir.path(), addr, AdmissionMode::Identity)).unwrap();
    assert_eq!(node.spots().unwrap().used, 1);
    let router = spotgate_rpc::router(node.rpc_state());
    assert_eq!(
        call(&router, post("/join", wallet_join(5))).await.0,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn webhook_greets_through_bot_api() {
    let (upstream, addr) = start_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let node = GateNode::new(config(dir.path(), addr, AdmissionMode::Identity)).unwrap();
    let router = spotgate_rpc::router(node.rpc_state());

    let update = json!({
        "update_id": 77,
        "message": {
            "message_id": 3,
            "chat": { "id": -1009876, "type": "supergroup" },
            "new_chat_members": [{ "id": 5, "is_bot": false, "first_name": "Grace" }]
        }
    });
    let (status, body) = call(&router, post("/telegram-webhook", update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let mut sent = Vec::new();
    for _ in 0..100 {
        sent = upstream.calls_to("sendMessage");
        if !sent.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(sent.len(), 1);
    let params: Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(params["chat_id"], -1009876);
    assert_eq!(params["text"], "Welcome, Grace!");
}
