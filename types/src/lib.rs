//! Fundamental types for Spotgate.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! wallet addresses, key material, timestamps, and admission records.

pub mod address;
pub mod error;
pub mod keys;
pub mod record;
pub mod time;

pub use address::WalletAddress;
pub use error::SpotgateError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use record::{AdmissionRecord, Claim, RecordKey};
pub use time::Timestamp;
