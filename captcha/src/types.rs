//! Verification verdicts and the siteverify wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CaptchaError;

/// Outcome of one human-verification attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Verdict {
    pub success: bool,
    /// Opaque diagnostic payload, passed back to the client on failure.
    pub details: Value,
}

impl Verdict {
    /// A failed verdict describing why the check could not pass.
    pub fn failed(error: &CaptchaError) -> Self {
        Self {
            success: false,
            details: serde_json::json!({
                "error-codes": [error.code()],
                "message": error.to_string(),
            }),
        }
    }
}

/// Response body of a `siteverify` call. Turnstile and hCaptcha share these
/// fields; anything else is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct SiteVerifyResponse {
    pub success: bool,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub challenge_ts: Option<String>,
}

impl From<SiteVerifyResponse> for Verdict {
    fn from(resp: SiteVerifyResponse) -> Self {
        Verdict {
            success: resp.success,
            details: serde_json::json!({
                "error-codes": resp.error_codes,
                "hostname": resp.hostname,
                "challenge_ts": resp.challenge_ts,
            }),
        }
    }
}
