//! Cryptographic primitives for Spotgate.
//!
//! - **Ed25519** detached signatures over the UTF-8 bytes of a challenge message
//! - Wallet addresses are base58-encoded 32-byte public keys
//! - Signatures arrive as base64 or base58 text

pub mod address;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod sign;

pub use address::{decode_address, derive_address, parse_address};
pub use encoding::{decode_signature, encode_signature, SignatureEncoding};
pub use error::CryptoError;
pub use keys::{generate_keypair, keypair_from_seed};
pub use sign::{sign_message, verify_signature, verify_wallet_proof};
