//! Wallet address parsing and derivation.
//!
//! Address format: base58 (Bitcoin alphabet) of the raw 32-byte Ed25519
//! public key, 32 to 44 characters long. No prefix and no checksum.

use ed25519_dalek::VerifyingKey;
use spotgate_types::{PublicKey, WalletAddress};

use crate::CryptoError;

/// Shortest base58 text that can encode 32 bytes.
const MIN_ADDRESS_CHARS: usize = 32;
/// Longest base58 text that can encode 32 bytes.
const MAX_ADDRESS_CHARS: usize = 44;

/// Derive the wallet address for a public key.
pub fn derive_address(public_key: &PublicKey) -> WalletAddress {
    WalletAddress::new(bs58::encode(public_key.as_bytes()).into_string())
}

/// Extract the public key bytes from an address string.
///
/// Returns `None` if the text is not base58 or does not decode to exactly
/// 32 bytes. Does not check that the bytes form a valid curve point.
pub fn decode_address(address: &str) -> Option<[u8; 32]> {
    if address.len() < MIN_ADDRESS_CHARS || address.len() > MAX_ADDRESS_CHARS {
        return None;
    }
    let mut out = [0u8; 32];
    match bs58::decode(address).onto(&mut out) {
        Ok(32) => Some(out),
        _ => None,
    }
}

/// Parse and validate a claimed wallet address.
///
/// The address must decode to 32 bytes that form a valid Ed25519 public
/// key. Leading and trailing whitespace is ignored.
pub fn parse_address(address: &str) -> Result<(WalletAddress, PublicKey), CryptoError> {
    let trimmed = address.trim();
    let bytes = decode_address(trimmed)
        .ok_or_else(|| CryptoError::InvalidAddress("not a base58 32-byte key".to_string()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| CryptoError::InvalidAddress("not a valid Ed25519 point".to_string()))?;
    Ok((WalletAddress::new(trimmed), PublicKey(bytes)))
}
