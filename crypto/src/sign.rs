//! Ed25519 message signing and wallet-ownership verification.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use spotgate_types::{PrivateKey, PublicKey, Signature};

use crate::encoding::{decode_signature, SignatureEncoding};
use crate::{parse_address, CryptoError};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a detached signature against a message and public key.
///
/// Uses strict verification, so non-canonical signatures and small-order
/// keys are rejected.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

/// Check that `address` signed the UTF-8 bytes of `message`.
///
/// A malformed address is an error; a signature that does not decode or does
/// not verify is `Ok(false)`. Pure function of its inputs.
pub fn verify_wallet_proof(
    address: &str,
    message: &str,
    signature_text: &str,
    encoding: SignatureEncoding,
) -> Result<bool, CryptoError> {
    let (_, public_key) = parse_address(address)?;
    let Some(signature) = decode_signature(signature_text, encoding) else {
        return Ok(false);
    };
    Ok(verify_signature(message.as_bytes(), &signature, &public_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derive_address, encode_signature, keypair_from_seed};

    const CHALLENGE: &str = "Sign in to join the group";

    #[test]
    fn sign_and_verify() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(CHALLENGE.as_bytes(), &kp.private);
        assert!(verify_signature(CHALLENGE.as_bytes(), &sig, &kp.public));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(b"correct message", &kp.private);
        assert!(!verify_signature(b"wrong message", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"test", &kp1.private);
        assert!(!verify_signature(b"test", &sig, &kp2.public));
    }

    #[test]
    fn wallet_proof_accepts_both_encodings() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let addr = derive_address(&kp.public);
        let sig = sign_message(CHALLENGE.as_bytes(), &kp.private);
        for encoding in [SignatureEncoding::Base64, SignatureEncoding::Base58] {
            let text = encode_signature(&sig, encoding);
            assert_eq!(
                verify_wallet_proof(addr.as_str(), CHALLENGE, &text, encoding),
                Ok(true)
            );
        }
    }

    #[test]
    fn wallet_proof_distinguishes_bad_address_from_bad_signature() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let other = keypair_from_seed(&[6u8; 32]);
        let sig = sign_message(CHALLENGE.as_bytes(), &other.private);
        let text = encode_signature(&sig, SignatureEncoding::Base58);

        let addr = derive_address(&kp.public);
        assert_eq!(
            verify_wallet_proof(addr.as_str(), CHALLENGE, &text, SignatureEncoding::Base58),
            Ok(false)
        );
        assert!(matches!(
            verify_wallet_proof("not-an-address", CHALLENGE, &text, SignatureEncoding::Base58),
            Err(CryptoError::InvalidAddress(_))
        ));
    }

    #[test]
    fn undecodable_signature_is_a_failed_proof() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let addr = derive_address(&kp.public);
        assert_eq!(
            verify_wallet_proof(addr.as_str(), CHALLENGE, "%%%", SignatureEncoding::Base64),
            Ok(false)
        );
    }

    #[test]
    fn invalid_public_key() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(b"test", &kp.private);
        let bad_key = PublicKey([0xFF; 32]);
        assert!(!verify_signature(b"test", &sig, &bad_key));
    }
}
