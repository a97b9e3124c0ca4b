//! Axum-based HTTP server.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use spotgate_admission::{AdmissionController, GateMetrics, WelcomeNotifier};

use crate::error::RpcError;
use crate::handlers;

/// Shared state for every handler.
pub struct RpcState {
    pub controller: Arc<AdmissionController>,
    /// `None` disables greetings; webhook updates are still acknowledged.
    pub notifier: Option<Arc<WelcomeNotifier>>,
    /// `None` disables `/metrics`.
    pub metrics: Option<Arc<GateMetrics>>,
    pub webhook_secret: Option<String>,
    pub trust_forwarded_for: bool,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Build the application router.
pub fn router(state: Arc<RpcState>) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::health))
        .route("/spots", get(handlers::spots))
        .route("/join", post(handlers::join))
        .route("/telegram-webhook", post(handlers::telegram_webhook));
    if state.metrics.is_some() {
        app = app.route("/metrics", get(handlers::metrics));
    }
    app.layer(cors_layer(&state.cors_origins)).with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: Arc<RpcState>,
}

impl RpcServer {
    pub fn with_state(addr: SocketAddr, state: Arc<RpcState>) -> Self {
        Self { addr, state }
    }

    /// Serve until the process exits.
    pub async fn start(&self) -> Result<(), RpcError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn start_with_shutdown<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| RpcError::Bind {
                addr: self.addr,
                source,
            })?;
        tracing::info!(addr = %self.addr, "HTTP server listening");

        let app = router(self.state.clone());
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))
    }
}
