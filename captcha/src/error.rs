use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("captcha secret is not configured")]
    MissingSecret,

    #[error("verification request failed: {0}")]
    RequestFailed(String),

    #[error("verification service unreachable: {0}")]
    Unreachable(String),

    #[error("invalid response from verification service: {0}")]
    InvalidResponse(String),
}

impl CaptchaError {
    /// Short machine-readable tag used in verdict diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            CaptchaError::MissingSecret => "missing-input-secret",
            CaptchaError::RequestFailed(_) => "request-failed",
            CaptchaError::Unreachable(_) => "unreachable",
            CaptchaError::InvalidResponse(_) => "invalid-response",
        }
    }
}
