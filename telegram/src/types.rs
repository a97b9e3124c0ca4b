//! Bot API wire types.
//!
//! Only the fields Spotgate reads are modelled; unknown fields are ignored so
//! schema additions on the Telegram side never break decoding.

use serde::{Deserialize, Serialize};
use spotgate_types::Timestamp;

/// Envelope around every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// `createChatInviteLink` result.
#[derive(Debug, Deserialize)]
pub struct ChatInviteLink {
    #[serde(default)]
    pub invite_link: Option<String>,
    #[serde(default)]
    pub expire_date: Option<u64>,
    #[serde(default)]
    pub member_limit: Option<u32>,
}

/// A freshly minted single-use invite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InviteLink {
    pub url: String,
    pub expires_at: Option<Timestamp>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Name to address the user by: first name, then `@username`, then the id.
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        if !first.is_empty() {
            return first.to_string();
        }
        match self.username.as_deref().map(str::trim) {
            Some(username) if !username.is_empty() => format!("@{username}"),
            _ => format!("user {}", self.id),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub new_chat_members: Vec<User>,
}

/// One side of a membership change.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub user: User,
    /// Only sent for `restricted`: whether the user is in the chat.
    #[serde(default)]
    pub is_member: Option<bool>,
}

impl ChatMember {
    /// Whether this status means the user is currently in the chat.
    pub fn is_present(&self) -> bool {
        match self.status.as_str() {
            "member" | "administrator" | "creator" => true,
            "restricted" => self.is_member.unwrap_or(false),
            _ => false,
        }
    }

    /// In the chat without admin rights, possibly restricted.
    fn is_ordinary_member(&self) -> bool {
        self.status == "member" || (self.status == "restricted" && self.is_present())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    pub date: u64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

impl ChatMemberUpdated {
    /// The user who just joined, if this change is a join.
    pub fn joined_user(&self) -> Option<&User> {
        let joined =
            self.new_chat_member.is_ordinary_member() && !self.old_chat_member.is_present();
        joined.then_some(&self.new_chat_member.user)
    }
}

/// An incoming webhook update.
#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub chat_member: Option<ChatMemberUpdated>,
}
