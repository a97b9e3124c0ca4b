//! Immutable admission settings, built once at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How applicants prove they may join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionMode {
    /// Wallet signature over the challenge message; one slot per wallet.
    #[serde(alias = "wallet")]
    Identity,
    /// Human verification only; slots are anonymous tickets.
    #[serde(alias = "captcha")]
    Anonymous,
}

impl AdmissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionMode::Identity => "identity",
            AdmissionMode::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for AdmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" | "wallet" => Ok(AdmissionMode::Identity),
            "anonymous" | "captcha" => Ok(AdmissionMode::Anonymous),
            other => Err(format!("unknown admission mode '{other}'")),
        }
    }
}

/// Everything the controller needs to decide an attempt.
#[derive(Clone, Debug)]
pub struct AdmissionPolicy {
    pub mode: AdmissionMode,
    /// Total number of slots.
    pub max_spots: u64,
    /// The exact message wallets must sign.
    pub challenge_message: String,
    /// In identity mode, also require a human-verification token.
    pub require_captcha: bool,
}

impl AdmissionPolicy {
    /// Whether attempts under this policy call the human verifier.
    pub fn needs_human_verification(&self) -> bool {
        match self.mode {
            AdmissionMode::Anonymous => true,
            AdmissionMode::Identity => self.require_captcha,
        }
    }
}
