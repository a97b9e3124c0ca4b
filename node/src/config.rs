//! Gate configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use spotgate_admission::{AdmissionMode, AdmissionPolicy, DEFAULT_TEMPLATE};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a Spotgate server.
///
/// Can be loaded from a TOML file via [`GateConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Loaded once at startup and never
/// changed afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Total number of admission slots.
    #[serde(default = "default_max_spots")]
    pub max_spots: u64,

    /// "identity" (wallet signature) or "anonymous" (captcha only).
    #[serde(default = "default_mode")]
    pub mode: AdmissionMode,

    /// The exact text wallets sign to prove ownership.
    #[serde(default = "default_challenge_message")]
    pub challenge_message: String,

    /// In identity mode, also require a captcha token.
    #[serde(default)]
    pub require_captcha: bool,

    /// Server-side secret for the captcha service.
    #[serde(default)]
    pub captcha_secret: Option<String>,

    /// `siteverify` endpoint (Turnstile by default; hCaptcha works too).
    #[serde(default = "default_captcha_verify_url")]
    pub captcha_verify_url: String,

    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Numeric id (`-100...`) or `@channelusername` of the gated group.
    #[serde(default)]
    pub telegram_chat_id: Option<String>,

    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Invite links expire this many seconds after creation.
    #[serde(default)]
    pub invite_ttl_secs: Option<u64>,

    /// Label attached to created invite links.
    #[serde(default)]
    pub invite_name: Option<String>,

    /// Greet members from the webhook.
    #[serde(default)]
    pub welcome_enabled: bool,

    /// Greeting text; `{name}` is replaced by the member's name.
    #[serde(default = "default_welcome_template")]
    pub welcome_template: String,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` on webhook calls.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Take the client address from `X-Forwarded-For`.
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Timeout for each captcha and Bot API call.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Whether to serve Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// LMDB memory map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./spotgate_data")
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_max_spots() -> u64 {
    100
}

fn default_mode() -> AdmissionMode {
    AdmissionMode::Identity
}

fn default_challenge_message() -> String {
    "Sign this message to prove you own this wallet and join the group.".to_string()
}

fn default_captcha_verify_url() -> String {
    spotgate_captcha::client::TURNSTILE_VERIFY_URL.to_string()
}

fn default_telegram_api_url() -> String {
    spotgate_telegram::client::TELEGRAM_API_URL.to_string()
}

fn default_welcome_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size_mb() -> usize {
    64
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GateConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("GateConfig is always serializable to TOML")
    }

    /// Check that everything the configured mode needs is present.
    pub fn validate(&self) -> Result<(), NodeError> {
        if non_blank(&self.telegram_bot_token).is_none() {
            return Err(NodeError::Config("telegram_bot_token is required".into()));
        }
        if non_blank(&self.telegram_chat_id).is_none() {
            return Err(NodeError::Config("telegram_chat_id is required".into()));
        }
        if self.policy().needs_human_verification() && non_blank(&self.captcha_secret).is_none() {
            return Err(NodeError::Config(format!(
                "captcha_secret is required in {} mode{}",
                self.mode,
                if self.require_captcha {
                    " with require_captcha"
                } else {
                    ""
                }
            )));
        }
        if self.challenge_message.is_empty() && self.mode == AdmissionMode::Identity {
            return Err(NodeError::Config("challenge_message must not be empty".into()));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(NodeError::Config("upstream_timeout_secs must be positive".into()));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            mode: self.mode,
            max_spots: self.max_spots,
            challenge_message: self.challenge_message.clone(),
            require_captcha: self.require_captcha,
        }
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse().map_err(NodeError::Config)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// The group chat id when it is numeric. `@username` ids cannot be
    /// matched against update chat ids.
    pub fn numeric_chat_id(&self) -> Option<i64> {
        non_blank(&self.telegram_chat_id).and_then(|id| id.parse().ok())
    }

    pub fn webhook_secret(&self) -> Option<String> {
        non_blank(&self.webhook_secret).map(str::to_string)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_addr: default_listen_addr(),
            max_spots: default_max_spots(),
            mode: default_mode(),
            challenge_message: default_challenge_message(),
            require_captcha: false,
            captcha_secret: None,
            captcha_verify_url: default_captcha_verify_url(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_url: default_telegram_api_url(),
            invite_ttl_secs: None,
            invite_name: None,
            welcome_enabled: false,
            welcome_template: default_welcome_template(),
            webhook_secret: None,
            cors_origins: Vec::new(),
            trust_forwarded_for: false,
            upstream_timeout_secs: default_upstream_timeout_secs(),
            enable_metrics: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
            map_size_mb: default_map_size_mb(),
        }
    }
}
