//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the admission flow (storage, the captcha
//! service, the Telegram Bot API) sits behind a trait. This crate provides
//! in-memory implementations that:
//! - Return scripted results
//! - Record what they were asked to do, for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod captcha;
pub mod store;
pub mod telegram;

pub use captcha::NullHumanVerifier;
pub use store::NullStore;
pub use telegram::{NullInviteIssuer, NullMessenger};
