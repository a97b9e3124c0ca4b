use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    /// The Bot API answered `ok: false`.
    #[error("{description}")]
    Api {
        description: String,
        error_code: Option<i64>,
    },

    #[error("invite link missing from Bot API response")]
    MissingInviteLink,

    #[error("Bot API request failed: {0}")]
    Transport(String),

    #[error("invalid response from Bot API: {0}")]
    InvalidResponse(String),

    #[error("Bot API client configuration error: {0}")]
    Config(String),
}

impl TelegramError {
    /// Structured diagnostics for callers that pass upstream failures on.
    pub fn details(&self) -> Option<Value> {
        match self {
            TelegramError::Api { error_code, .. } => {
                error_code.map(|code| serde_json::json!({ "error_code": code }))
            }
            _ => None,
        }
    }
}
