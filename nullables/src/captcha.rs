//! Nullable human verifier: scripted verdicts.

use async_trait::async_trait;
use spotgate_captcha::{HumanVerifier, Verdict};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A verifier that answers every token the same way until told otherwise.
pub struct NullHumanVerifier {
    accept: AtomicBool,
    calls: AtomicUsize,
    last_remote_ip: Mutex<Option<String>>,
}

impl NullHumanVerifier {
    /// A verifier that accepts every token.
    pub fn accepting() -> Self {
        Self {
            accept: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            last_remote_ip: Mutex::new(None),
        }
    }

    /// A verifier that rejects every token.
    pub fn rejecting() -> Self {
        let verifier = Self::accepting();
        verifier.set_accept(false);
        verifier
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_remote_ip(&self) -> Option<String> {
        self.last_remote_ip.lock().unwrap().clone()
    }
}

#[async_trait]
impl HumanVerifier for NullHumanVerifier {
    async fn verify(&self, _token: &str, remote_ip: Option<&str>) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_remote_ip.lock().unwrap() = remote_ip.map(str::to_string);
        if self.accept.load(Ordering::SeqCst) {
            Verdict {
                success: true,
                details: serde_json::json!({ "error-codes": [] }),
            }
        } else {
            Verdict {
                success: false,
                details: serde_json::json!({ "error-codes": ["invalid-input-response"] }),
            }
        }
    }
}
