//! Text encodings accepted for detached signatures.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use spotgate_types::Signature;

/// How a client encoded its 64-byte signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    /// Standard base64 with padding.
    Base64,
    /// Base58, Bitcoin alphabet.
    Base58,
}

/// Decode signature text. Returns `None` for invalid text or any length
/// other than 64 bytes.
pub fn decode_signature(text: &str, encoding: SignatureEncoding) -> Option<Signature> {
    let text = text.trim();
    let bytes = match encoding {
        SignatureEncoding::Base64 => STANDARD.decode(text).ok()?,
        SignatureEncoding::Base58 => bs58::decode(text).into_vec().ok()?,
    };
    Signature::from_slice(&bytes)
}

/// Encode a signature in the given text encoding.
pub fn encode_signature(signature: &Signature, encoding: SignatureEncoding) -> String {
    match encoding {
        SignatureEncoding::Base64 => STANDARD.encode(signature.as_bytes()),
        SignatureEncoding::Base58 => bs58::encode(signature.as_bytes()).into_string(),
    }
}
