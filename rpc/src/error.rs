//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use thiserror::Error;

use spotgate_admission::AdmissionError;

/// Failures of the server itself.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),
}

/// A request that ended in an error response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body was not the JSON object the endpoint expects.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Admission(#[from] AdmissionError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    telegram_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            telegram_error: None,
            details: None,
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Admission(e) => match e {
                AdmissionError::MissingInput(_) | AdmissionError::InvalidIdentity(_) => {
                    StatusCode::BAD_REQUEST
                }
                AdmissionError::UnauthorizedSignature => StatusCode::UNAUTHORIZED,
                AdmissionError::HumanVerificationFailed { .. }
                | AdmissionError::CapacityExceeded => StatusCode::FORBIDDEN,
                AdmissionError::Duplicate => StatusCode::CONFLICT,
                AdmissionError::UpstreamIssuanceFailed { .. } | AdmissionError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            ApiError::BadRequest(detail) => ErrorBody {
                error: "invalid request body".to_string(),
                telegram_error: None,
                details: Some(Value::String(detail)),
            },
            ApiError::Admission(e) => match e {
                AdmissionError::HumanVerificationFailed { details } => ErrorBody {
                    error: "human verification failed".to_string(),
                    telegram_error: None,
                    details: Some(details),
                },
                AdmissionError::UpstreamIssuanceFailed { message, details } => ErrorBody {
                    error: "failed to create invite link".to_string(),
                    telegram_error: Some(message),
                    details,
                },
                // Logged by the controller; never echoed to the client.
                AdmissionError::Internal(_) => ErrorBody::message("internal error"),
                other => ErrorBody::message(other.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.body())).into_response()
    }
}
