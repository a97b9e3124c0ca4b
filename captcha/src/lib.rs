//! Human-verification client.
//!
//! Submits a client-provided captcha token to a `siteverify` endpoint and
//! reduces the answer to a [`Verdict`]. Every failure path yields a failed
//! verdict; nothing here can produce a false success.

pub mod client;
pub mod error;
pub mod types;

pub use client::{CaptchaClient, HumanVerifier};
pub use error::CaptchaError;
pub use types::Verdict;
