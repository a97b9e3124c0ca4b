//! HTTP API for the Spotgate gate.
//!
//! Provides endpoints for:
//! - Health (`GET /`)
//! - Capacity usage (`GET /spots`)
//! - Join attempts (`POST /join`)
//! - Telegram webhook updates (`POST /telegram-webhook`)
//! - Prometheus metrics (`GET /metrics`, when enabled)

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, RpcError};
pub use server::{router, RpcServer, RpcState};
