//! The admission state machine.
//!
//! One call to [`AdmissionController::admit`] walks a join attempt through:
//!
//! 1. capacity check against a snapshot of the record count
//! 2. input validation for the configured mode
//! 3. proof: wallet signature (identity) or human verification (anonymous)
//! 4. duplicate pre-check (identity only)
//! 5. reservation, atomic with a second capacity and uniqueness check
//! 6. invite issuance, with a compensating delete of exactly this
//!    reservation if issuance fails
//!
//! Steps 1 and 4 are early exits only; step 5 is what enforces the limits.

use serde::Serialize;
use std::sync::Arc;

use spotgate_captcha::{CaptchaError, HumanVerifier, Verdict};
use spotgate_crypto::{verify_wallet_proof, CryptoError, SignatureEncoding};
use spotgate_store::AdmissionStore;
use spotgate_telegram::InviteIssuer;
use spotgate_types::{AdmissionRecord, Claim, Timestamp, WalletAddress};

use crate::error::AdmissionError;
use crate::metrics::GateMetrics;
use crate::policy::{AdmissionMode, AdmissionPolicy};

/// Raw fields of a join request. Blank strings count as absent.
#[derive(Clone, Debug, Default)]
pub struct JoinAttempt {
    pub wallet: Option<String>,
    pub signature_base64: Option<String>,
    pub signature_base58: Option<String>,
    pub captcha_token: Option<String>,
    /// Requester address, forwarded to the human-verification service.
    pub remote_ip: Option<String>,
}

/// A successful admission.
#[derive(Clone, Debug)]
pub struct Admission {
    pub invite_link: String,
    /// Slots left, computed from the pre-reservation snapshot.
    pub spots_remaining: u64,
    pub record: AdmissionRecord,
}

/// Capacity usage as reported by `/spots`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SpotUsage {
    pub max: u64,
    pub used: u64,
    pub remaining: u64,
}

impl SpotUsage {
    pub fn new(max: u64, used: u64) -> Self {
        Self {
            max,
            used,
            remaining: max.saturating_sub(used),
        }
    }
}

pub struct AdmissionController {
    policy: AdmissionPolicy,
    store: Arc<dyn AdmissionStore>,
    issuer: Arc<dyn InviteIssuer>,
    verifier: Option<Arc<dyn HumanVerifier>>,
    metrics: Arc<GateMetrics>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl AdmissionController {
    pub fn new(
        policy: AdmissionPolicy,
        store: Arc<dyn AdmissionStore>,
        issuer: Arc<dyn InviteIssuer>,
        metrics: Arc<GateMetrics>,
    ) -> Self {
        Self {
            policy,
            store,
            issuer,
            verifier: None,
            metrics,
        }
    }

    /// Attach the human-verification client used by anonymous mode and by
    /// identity mode when `require_captcha` is set.
    pub fn with_human_verifier(mut self, verifier: Arc<dyn HumanVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<GateMetrics> {
        &self.metrics
    }

    /// Current capacity usage.
    pub fn spots(&self) -> Result<SpotUsage, AdmissionError> {
        let used = self.store.count()?;
        self.metrics.set_spots_used(used);
        Ok(SpotUsage::new(self.policy.max_spots, used))
    }

    /// Run one join attempt to completion.
    pub async fn admit(&self, attempt: JoinAttempt) -> Result<Admission, AdmissionError> {
        self.metrics.join_attempts.inc();
        let result = self.run(attempt).await;
        match &result {
            Ok(admission) => {
                self.metrics.admissions.inc();
                tracing::info!(
                    key = %admission.record.key,
                    spots_remaining = admission.spots_remaining,
                    "admission granted"
                );
            }
            Err(e) => {
                self.metrics.record_rejection(e.reason());
                match e {
                    AdmissionError::Internal(msg) => {
                        tracing::error!(error = %msg, "admission failed internally")
                    }
                    other => tracing::info!(reason = other.reason(), "admission refused"),
                }
            }
        }
        result
    }

    async fn run(&self, attempt: JoinAttempt) -> Result<Admission, AdmissionError> {
        let max = self.policy.max_spots;
        let used = self.store.count()?;
        self.metrics.set_spots_used(used);
        if used >= max {
            return Err(AdmissionError::CapacityExceeded);
        }

        let claim = match self.policy.mode {
            AdmissionMode::Identity => {
                let wallet = self.prove_wallet(&attempt)?;
                if self.policy.require_captcha {
                    self.prove_human(&attempt).await?;
                }
                if self.store.contains_wallet(&wallet)? {
                    return Err(AdmissionError::Duplicate);
                }
                Claim::Wallet(wallet)
            }
            AdmissionMode::Anonymous => {
                self.prove_human(&attempt).await?;
                Claim::Anonymous
            }
        };

        let record = self.store.reserve(&claim, max, Timestamp::now())?;

        match self.issuer.create_single_use_invite().await {
            Ok(invite) => Ok(Admission {
                invite_link: invite.url,
                spots_remaining: max.saturating_sub(used + 1),
                record,
            }),
            Err(e) => {
                tracing::warn!(key = %record.key, error = %e, "invite issuance failed, releasing slot");
                self.rollback(&record);
                Err(AdmissionError::UpstreamIssuanceFailed {
                    message: e.to_string(),
                    details: e.details(),
                })
            }
        }
    }

    /// Check the wallet signature over the challenge message.
    fn prove_wallet(&self, attempt: &JoinAttempt) -> Result<WalletAddress, AdmissionError> {
        let wallet = present(&attempt.wallet).ok_or(AdmissionError::MissingInput("wallet"))?;
        let (signature, encoding) = match (
            present(&attempt.signature_base64),
            present(&attempt.signature_base58),
        ) {
            (Some(sig), _) => (sig, SignatureEncoding::Base64),
            (None, Some(sig)) => (sig, SignatureEncoding::Base58),
            (None, None) => {
                return Err(AdmissionError::MissingInput(
                    "signatureBase64 or signatureBase58",
                ))
            }
        };

        let (address, _) = spotgate_crypto::parse_address(wallet).map_err(|e| match e {
            CryptoError::InvalidAddress(msg) => AdmissionError::InvalidIdentity(msg),
        })?;

        match verify_wallet_proof(
            address.as_str(),
            &self.policy.challenge_message,
            signature,
            encoding,
        ) {
            Ok(true) => Ok(address),
            Ok(false) => Err(AdmissionError::UnauthorizedSignature),
            Err(CryptoError::InvalidAddress(msg)) => Err(AdmissionError::InvalidIdentity(msg)),
        }
    }

    /// Run human verification; one outbound call, no retry.
    async fn prove_human(&self, attempt: &JoinAttempt) -> Result<(), AdmissionError> {
        let token =
            present(&attempt.captcha_token).ok_or(AdmissionError::MissingInput("captchaToken"))?;
        let Some(verifier) = &self.verifier else {
            return Err(AdmissionError::HumanVerificationFailed {
                details: Verdict::failed(&CaptchaError::MissingSecret).details,
            });
        };
        let verdict = verifier.verify(token, present(&attempt.remote_ip)).await;
        if verdict.success {
            Ok(())
        } else {
            Err(AdmissionError::HumanVerificationFailed {
                details: verdict.details,
            })
        }
    }

    /// Compensating delete of a reservation. Best-effort: a failure here is
    /// logged and never changes the response.
    fn rollback(&self, record: &AdmissionRecord) {
        match self.store.release(&record.key) {
            Ok(true) => self.metrics.rollbacks.inc(),
            Ok(false) => {
                tracing::warn!(key = %record.key, "reservation already gone during rollback")
            }
            Err(e) => tracing::error!(key = %record.key, error = %e, "rollback failed"),
        }
    }
}
