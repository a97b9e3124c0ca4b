//! Errors raised by the shared types themselves.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpotgateError {
    /// Stored key bytes do not match either record key layout.
    #[error("invalid record key: {0}")]
    InvalidRecordKey(String),
}
