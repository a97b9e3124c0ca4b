//! Admission control for a capacity-limited private group.
//!
//! The [`AdmissionController`] runs one join attempt through capacity check,
//! proof (wallet signature or human verification), reservation, and invite
//! issuance, undoing the reservation if issuance fails. The
//! [`WelcomeNotifier`] greets members once they actually join.

pub mod controller;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod welcome;

pub use controller::{Admission, AdmissionController, JoinAttempt, SpotUsage};
pub use error::AdmissionError;
pub use metrics::GateMetrics;
pub use policy::{AdmissionMode, AdmissionPolicy};
pub use welcome::{WelcomeNotifier, DEFAULT_TEMPLATE};
