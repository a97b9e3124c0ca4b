//! HTTP client for the Telegram Bot API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use spotgate_types::Timestamp;

use crate::error::TelegramError;
use crate::types::{ApiResponse, ChatInviteLink, InviteLink};

/// Public Bot API endpoint.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default timeout for Bot API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Mints single-use invite links into the gated group.
#[async_trait]
pub trait InviteIssuer: Send + Sync {
    /// Create an invite that admits exactly one member.
    async fn create_single_use_invite(&self) -> Result<InviteLink, TelegramError>;
}

/// Sends plain text messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError>;
}

/// Settings for [`BotClient`].
#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Bot token issued by @BotFather.
    pub token: String,
    /// The gated group: numeric id (`-100...`) or `@username`.
    pub chat_id: String,
    /// Base URL of the Bot API.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Invite links expire this many seconds after creation, if set.
    pub invite_ttl_secs: Option<u64>,
    /// Label attached to created invite links, visible to group admins.
    pub invite_name: Option<String>,
}

impl BotConfig {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            api_url: TELEGRAM_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            invite_ttl_secs: None,
            invite_name: None,
        }
    }
}

#[derive(Serialize)]
struct CreateInviteParams<'a> {
    chat_id: &'a str,
    member_limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire_date: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct SetWebhookParams<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_token: Option<&'a str>,
    allowed_updates: &'a [&'a str],
}

/// Client for the subset of Bot API methods Spotgate uses.
#[derive(Clone)]
pub struct BotClient {
    http: reqwest::Client,
    config: BotConfig,
}

impl BotClient {
    pub fn new(config: BotConfig) -> Result<Self, TelegramError> {
        if config.token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(config.timeout))
            .build()
            .map_err(|e| TelegramError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// The group this client issues invites for.
    pub fn chat_id(&self) -> &str {
        &self.config.chat_id
    }

    /// Register `url` as the bot's webhook, receiving message and
    /// membership updates.
    pub async fn set_webhook(
        &self,
        url: &str,
        secret_token: Option<&str>,
    ) -> Result<(), TelegramError> {
        let params = SetWebhookParams {
            url,
            secret_token,
            allowed_updates: &["message", "chat_member"],
        };
        let _: bool = self.call("setWebhook", &params).await?;
        Ok(())
    }

    /// Invoke a Bot API method and unwrap its `result`.
    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        unwrap_result(self.request(method, params).await?)
    }

    /// Invoke a Bot API method and return the raw envelope.
    async fn request<P, R>(&self, method: &str, params: &P) -> Result<ApiResponse<R>, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.token,
            method
        );

        // The URL carries the bot token; keep it out of error messages.
        let response = self
            .http
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    TelegramError::Transport(format!("{method} timed out: {e}"))
                } else {
                    TelegramError::Transport(format!("{method}: {e}"))
                }
            })?;

        // Errors come back as non-2xx statuses with an `ok: false` envelope,
        // so the body is decoded regardless of status.
        let status = response.status();
        response.json().await.map_err(|e| {
            TelegramError::InvalidResponse(format!(
                "{method} returned HTTP {status}: {}",
                e.without_url()
            ))
        })
    }
}

/// Reduce a Bot API envelope to its result or a structured error.
fn unwrap_result<R>(body: ApiResponse<R>) -> Result<R, TelegramError> {
    if !body.ok {
        return Err(TelegramError::Api {
            description: body
                .description
                .unwrap_or_else(|| "Bot API returned ok=false".to_string()),
            error_code: body.error_code,
        });
    }
    body.result
        .ok_or_else(|| TelegramError::InvalidResponse("ok=true without result".to_string()))
}

/// Extract the invite URL from a `createChatInviteLink` result.
fn invite_from_result(result: ChatInviteLink) -> Result<InviteLink, TelegramError> {
    let url = result
        .invite_link
        .filter(|link| !link.trim().is_empty())
        .ok_or(TelegramError::MissingInviteLink)?;
    Ok(InviteLink {
        url,
        expires_at: result.expire_date.map(Timestamp::new),
    })
}

#[async_trait]
impl InviteIssuer for BotClient {
    async fn create_single_use_invite(&self) -> Result<InviteLink, TelegramError> {
        let params = CreateInviteParams {
            chat_id: &self.config.chat_id,
            member_limit: 1,
            expire_date: self
                .config
                .invite_ttl_secs
                .map(|ttl| Timestamp::now().plus_secs(ttl).as_secs()),
            name: self.config.invite_name.as_deref(),
        };
        let body: ApiResponse<ChatInviteLink> =
            self.request("createChatInviteLink", &params).await?;
        let result = match unwrap_result(body) {
            Ok(result) => result,
            Err(TelegramError::InvalidResponse(_)) => return Err(TelegramError::MissingInviteLink),
            Err(e) => return Err(e),
        };
        let invite = invite_from_result(result)?;
        tracing::debug!(expires_at = ?invite.expires_at, "created single-use invite");
        Ok(invite)
    }
}

#[async_trait]
impl Messenger for BotClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let params = SendMessageParams { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &params).await?;
        Ok(())
    }
}
