//! Router-level tests for the HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use spotgate_admission::{
    AdmissionController, AdmissionMode, AdmissionPolicy, GateMetrics, WelcomeNotifier,
};
use spotgate_crypto::{
    derive_address, encode_signature, keypair_from_seed, sign_message, SignatureEncoding,
};
use spotgate_nullables::{NullHumanVerifier, NullInviteIssuer, NullMessenger, NullStore};
use spotgate_rpc::{router, RpcState};

const CHALLENGE: &str = "Prove you own this wallet";
const GROUP: i64 = -100_200;

struct App {
    router: Router,
    issuer: Arc<NullInviteIssuer>,
    verifier: Arc<NullHumanVerifier>,
    messenger: Arc<NullMessenger>,
}

fn app(mode: AdmissionMode, max_spots: u64, webhook_secret: Option<&str>) -> App {
    let issuer = Arc::new(NullInviteIssuer::new());
    let verifier = Arc::new(NullHumanVerifier::accepting());
    let messenger = Arc::new(NullMessenger::new());
    let metrics = Arc::new(GateMetrics::new());
    let policy = AdmissionPolicy {
        mode,
        max_spots,
        challenge_message: CHALLENGE.to_string(),
        require_captcha: false,
    };
    let controller = AdmissionController::new(
        policy,
        Arc::new(NullStore::new()),
        issuer.clone(),
        metrics.clone(),
    )
    .with_human_verifier(verifier.clone());
    let notifier = WelcomeNotifier::new(messenger.clone(), "Welcome, {name}!", metrics.clone())
        .restrict_to_chat(GROUP);

    let state = Arc::new(RpcState {
        controller: Arc::new(controller),
        notifier: Some(Arc::new(notifier)),
        metrics: Some(metrics),
        webhook_secret: webhook_secret.map(str::to_string),
        trust_forwarded_for: true,
        cors_origins: Vec::new(),
    });
    App {
        router: router(state),
        issuer,
        verifier,
        messenger,
    }
}

fn signed_body(seed: u8) -> Value {
    let kp = keypair_from_seed(&[seed; 32]);
    let sig = sign_message(CHALLENGE.as_bytes(), &kp.private);
    json!({
        "wallet": derive_address(&kp.public).to_string(),
        "signatureBase58": encode_signature(&sig, SignatureEncoding::Base58),
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn get_json(router: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::get(path).body(Body::empty()).unwrap();
    let (status, bytes) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(router: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.23")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_check() {
    let app = app(AdmissionMode::Identity, 3, None);
    let (status, body) = get_json(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn identity_join_then_duplicate() {
    let app = app(AdmissionMode::Identity, 3, None);

    let (status, body) = post_json(&app.router, "/join", &signed_body(1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invite_link"], "https://t.me/+null1");
    assert_eq!(body["spots_remaining"], 2);

    let (status, body) = post_json(&app.router, "/join", &signed_body(1)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (_, spots) = get_json(&app.router, "/spots").await;
    assert_eq!(spots, json!({ "max": 3, "used": 1, "remaining": 2 }));
}

#[tokio::test]
async fn full_group_is_forbidden() {
    let app = app(AdmissionMode::Identity, 1, None);
    post_json(&app.router, "/join", &signed_body(1)).await;

    let (status, _) = post_json(&app.router, "/join", &signed_body(2)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, spots) = get_json(&app.router, "/spots").await;
    assert_eq!(spots["remaining"], 0);
}

#[tokio::test]
async fn anonymous_join_forwards_client_ip() {
    let app = app(AdmissionMode::Anonymous, 2, None);
    let (status, body) = post_json(&app.router, "/join", &json!({ "captchaToken": "tok" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spots_remaining"], 1);
    assert_eq!(app.verifier.last_remote_ip().as_deref(), Some("198.51.100.23"));
}

#[tokio::test]
async fn upstream_failure_returns_telegram_error() {
    let app = app(AdmissionMode::Anonymous, 2, None);
    app.issuer.set_fail(true);

    let (status, body) = post_json(&app.router, "/join", &json!({ "captchaToken": "tok" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["telegram_error"]
        .as_str()
        .unwrap()
        .contains("not enough rights"));
    let (_, spots) = get_json(&app.router, "/spots").await;
    assert_eq!(spots["used"], 0);
}

#[tokio::test]
async fn error_statuses() {
    let app = app(AdmissionMode::Identity, 5, None);

    let (status, _) = post_json(&app.router, "/join", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut forged = signed_body(1);
    forged["signatureBase58"] = signed_body(2)["signatureBase58"].clone();
    let (status, _) = post_json(&app.router, "/join", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let anon = self::app(AdmissionMode::Anonymous, 5, None);
    anon.verifier.set_accept(false);
    let (status, body) = post_json(&anon.router, "/join", &json!({ "captchaToken": "t" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["details"].is_object());
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let app = app(AdmissionMode::Identity, 5, None);
    let request = Request::post("/join")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid request body");
}

fn join_update() -> String {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 9,
            "chat": { "id": GROUP, "type": "supergroup" },
            "new_chat_members": [{ "id": 42, "is_bot": false, "first_name": "Ada" }]
        }
    })
    .to_string()
}

async fn wait_for_messages(messenger: &NullMessenger, expected: usize) -> Vec<(i64, String)> {
    for _ in 0..50 {
        let sent = messenger.sent();
        if sent.len() >= expected {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    messenger.sent()
}

#[tokio::test]
async fn webhook_acknowledges_and_greets() {
    let app = app(AdmissionMode::Identity, 5, None);
    let request = Request::post("/telegram-webhook")
        .header("content-type", "application/json")
        .body(Body::from(join_update()))
        .unwrap();

    let (status, bytes) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(bytes.is_empty());
    let sent = wait_for_messages(&app.messenger, 1).await;
    assert_eq!(sent, vec![(GROUP, "Welcome, Ada!".to_string())]);
}

#[tokio::test]
async fn webhook_with_wrong_secret_is_dropped() {
    let app = app(AdmissionMode::Identity, 5, Some("s3cret"));
    let request = Request::post("/telegram-webhook")
        .header("x-telegram-bot-api-secret-token", "wrong")
        .body(Body::from(join_update()))
        .unwrap();

    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.messenger.sent().is_empty());
}

#[tokio::test]
async fn webhook_garbage_still_acknowledged() {
    let app = app(AdmissionMode::Identity, 5, None);
    let request = Request::post("/telegram-webhook")
        .body(Body::from("nonsense"))
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn oversized_webhook_body_still_acknowledged() {
    let app = app(AdmissionMode::Identity, 5, None);
    let request = Request::post("/telegram-webhook")
        .header("content-type", "application/json")
        .body(Body::from(vec![b' '; 3 * 1024 * 1024]))
        .unwrap();

    let (status, bytes) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(bytes.is_empty());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.messenger.sent().is_empty());
}

#[tokio::test]
async fn metrics_endpoint_exposes_counters() {
    let app = app(AdmissionMode::Identity, 5, None);
    post_json(&app.router, "/join", &signed_body(1)).await;

    let request = Request::get("/metrics").body(Body::empty()).unwrap();
    let (status, bytes) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("spotgate_admissions_total 1"));
}
