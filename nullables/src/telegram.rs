//! Nullable Telegram: mint fake invites and record outgoing messages.

use async_trait::async_trait;
use spotgate_telegram::{InviteIssuer, InviteLink, Messenger, TelegramError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An invite issuer that hands out numbered links, or fails on demand with a
/// Bot API style error.
pub struct NullInviteIssuer {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl NullInviteIssuer {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let issuer = Self::new();
        issuer.set_fail(true);
        issuer
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of issuance attempts, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for NullInviteIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InviteIssuer for NullInviteIssuer {
    async fn create_single_use_invite(&self) -> Result<InviteLink, TelegramError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(TelegramError::Api {
                description: "Bad Request: not enough rights to manage chat invite links"
                    .to_string(),
                error_code: Some(400),
            });
        }
        Ok(InviteLink {
            url: format!("https://t.me/+null{n}"),
            expires_at: None,
        })
    }
}

/// A messenger that records every message instead of sending it.
pub struct NullMessenger {
    sent: Mutex<Vec<(i64, String)>>,
    fail: AtomicBool,
}

impl NullMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All messages "sent" so far, as `(chat_id, text)`.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for NullMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for NullMessenger {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TelegramError::Api {
                description: "Forbidden: bot was kicked from the group chat".to_string(),
                error_code: Some(403),
            });
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}
