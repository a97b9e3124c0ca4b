//! HTTP client for captcha `siteverify` endpoints.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CaptchaError;
use crate::types::{SiteVerifyResponse, Verdict};

/// Cloudflare Turnstile verification endpoint.
pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Default timeout for a verification request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can decide whether a token came from a human.
///
/// Implementations must fail closed: transport errors, malformed responses
/// and missing configuration all produce `Verdict { success: false, .. }`.
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Verdict;
}

/// Client for a Turnstile- or hCaptcha-compatible `siteverify` endpoint.
///
/// Sends one form-encoded `POST` with `secret`, `response` and optionally
/// `remoteip`, and reads the boolean `success` field. No retries.
pub struct CaptchaClient {
    http_client: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl CaptchaClient {
    /// Create a client for `verify_url` with the given per-request timeout.
    pub fn new(
        secret: impl Into<String>,
        verify_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CaptchaError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| CaptchaError::RequestFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            secret: secret.into(),
            verify_url: verify_url.into(),
        })
    }

    /// Create a client for Cloudflare Turnstile with the default timeout.
    pub fn turnstile(secret: impl Into<String>) -> Result<Self, CaptchaError> {
        Self::new(secret, TURNSTILE_VERIFY_URL, DEFAULT_TIMEOUT)
    }

    /// Perform the verification call, surfacing every failure as an error.
    pub async fn siteverify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
    ) -> Result<Verdict, CaptchaError> {
        if self.secret.is_empty() {
            return Err(CaptchaError::MissingSecret);
        }

        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .http_client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CaptchaError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    CaptchaError::Unreachable(format!("connection failed: {e}"))
                } else {
                    CaptchaError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(CaptchaError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: SiteVerifyResponse = response.json().await.map_err(|e| {
            CaptchaError::InvalidResponse(format!("failed to parse siteverify response: {e}"))
        })?;

        Ok(Verdict::from(body))
    }
}

#[async_trait]
impl HumanVerifier for CaptchaClient {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Verdict {
        match self.siteverify(token, remote_ip).await {
            Ok(verdict) => {
                if !verdict.success {
                    tracing::info!(details = %verdict.details, "captcha rejected token");
                }
                verdict
            }
            Err(e) => {
                tracing::warn!(error = %e, "captcha verification failed closed");
                Verdict::failed(&e)
            }
        }
    }
}
