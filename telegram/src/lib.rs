//! Telegram Bot API integration.
//!
//! - [`InviteIssuer`]: mint single-use (`member_limit = 1`) invite links
//! - [`Messenger`]: send plain text messages
//! - [`types`]: the subset of the update schema the webhook consumes

pub mod client;
pub mod error;
pub mod types;

pub use client::{BotClient, BotConfig, InviteIssuer, Messenger};
pub use error::TelegramError;
pub use types::{ChatMemberUpdated, InviteLink, Message, Update, User};
