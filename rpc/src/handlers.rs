//! HTTP request handlers.

use axum::body::{to_bytes, Body};
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

use spotgate_admission::{JoinAttempt, SpotUsage};
use spotgate_telegram::Update;

use crate::error::ApiError;
use crate::server::RpcState;

/// Header Telegram echoes back when a webhook was registered with a secret.
pub const TELEGRAM_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Largest webhook body read; anything bigger is acknowledged and dropped.
pub const MAX_WEBHOOK_BODY: usize = 1024 * 1024;

// ── Health ───────────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ── Spots ────────────────────────────────────────────────────────────────

pub async fn spots(State(state): State<Arc<RpcState>>) -> Result<Json<SpotUsage>, ApiError> {
    Ok(Json(state.controller.spots()?))
}

// ── Join ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub signature_base64: Option<String>,
    #[serde(default)]
    pub signature_base58: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub invite_link: String,
    pub spots_remaining: u64,
}

pub async fn join(
    State(state): State<Arc<RpcState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<JoinResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let attempt = JoinAttempt {
        wallet: request.wallet,
        signature_base64: request.signature_base64,
        signature_base58: request.signature_base58,
        captcha_token: request.captcha_token,
        remote_ip: client_ip(&headers, peer, state.trust_forwarded_for),
    };

    let admission = state.controller.admit(attempt).await?;
    Ok(Json(JoinResponse {
        invite_link: admission.invite_link,
        spots_remaining: admission.spots_remaining,
    }))
}

/// Address of the requester: the first `X-Forwarded-For` hop when the
/// deployment sits behind a trusted proxy, otherwise the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> Option<String> {
    if trust_forwarded {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }
    peer.map(|addr| addr.ip().to_string())
}

// ── Telegram webhook ─────────────────────────────────────────────────────

/// Acknowledge immediately; greetings run in a detached task.
pub async fn telegram_webhook(
    State(state): State<Arc<RpcState>>,
    headers: HeaderMap,
    body: Body,
) -> StatusCode {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let presented = headers
            .get(TELEGRAM_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            tracing::warn!("dropping webhook update with wrong secret token");
            return StatusCode::OK;
        }
    }

    let Some(notifier) = state.notifier.clone() else {
        return StatusCode::OK;
    };

    let body = match to_bytes(body, MAX_WEBHOOK_BODY).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "dropping unreadable webhook body");
            return StatusCode::OK;
        }
    };

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            tokio::spawn(async move {
                notifier.greet(&update).await;
            });
        }
        Err(e) => tracing::debug!(error = %e, "ignoring undecodable update"),
    }
    StatusCode::OK
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics(State(state): State<Arc<RpcState>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match metrics.encode() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
