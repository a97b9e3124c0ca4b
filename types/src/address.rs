//! Wallet address type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A wallet address: the base58 encoding of a 32-byte Ed25519 public key.
///
/// This type does not validate its contents. Use
/// `spotgate_crypto::parse_address` to obtain an address that is known to
/// decode to a valid public key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Wrap an already-validated address string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
