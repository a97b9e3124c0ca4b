//! Terminal outcomes of a failed admission attempt.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("missing required field: {0}")]
    MissingInput(&'static str),

    #[error("invalid wallet address: {0}")]
    InvalidIdentity(String),

    #[error("signature does not match wallet")]
    UnauthorizedSignature,

    #[error("human verification failed")]
    HumanVerificationFailed { details: Value },

    #[error("wallet already admitted")]
    Duplicate,

    #[error("all spots are taken")]
    CapacityExceeded,

    #[error("invite issuance failed: {message}")]
    UpstreamIssuanceFailed {
        message: String,
        details: Option<Value>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AdmissionError {
    /// Stable label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::MissingInput(_) => "missing_input",
            AdmissionError::InvalidIdentity(_) => "invalid_identity",
            AdmissionError::UnauthorizedSignature => "unauthorized_signature",
            AdmissionError::HumanVerificationFailed { .. } => "human_verification_failed",
            AdmissionError::Duplicate => "duplicate",
            AdmissionError::CapacityExceeded => "capacity_exceeded",
            AdmissionError::UpstreamIssuanceFailed { .. } => "upstream_issuance_failed",
            AdmissionError::Internal(_) => "internal",
        }
    }
}

impl From<spotgate_store::StoreError> for AdmissionError {
    fn from(e: spotgate_store::StoreError) -> Self {
        match e {
            spotgate_store::StoreError::Duplicate(_) => AdmissionError::Duplicate,
            spotgate_store::StoreError::CapacityReached { .. } => AdmissionError::CapacityExceeded,
            other => AdmissionError::Internal(other.to_string()),
        }
    }
}
