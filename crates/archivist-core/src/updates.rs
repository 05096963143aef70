//! Incoming update model and the port that produces it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    domain::{ChatId, MessageId, UserId},
    Result,
};

/// Long-polling feed of updates (Telegram `getUpdates` today).
///
/// Implementations block for up to `timeout` and return immediately when updates
/// are already queued. They do not retry; the engine's loop is the retry policy.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn poll(&self, offset: i64, timeout: Duration, limit: u32) -> Result<Vec<Update>>;
}

/// One unit of the remote feed.
#[derive(Clone, Debug)]
pub struct Update {
    pub update_id: Option<i64>,
    /// `None` for update kinds we do not handle and for messages missing their ids.
    pub message: Option<IncomingMessage>,
}

/// A chat membership change that concerns some participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    Joined,
    Left,
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
    pub sender: Option<UserId>,
    pub joined: Vec<UserId>,
    pub left: Option<UserId>,
    /// The message object exactly as received; this is what gets archived.
    pub raw: Value,
}

impl Update {
    /// Lenient parse: unknown fields and update kinds are tolerated.
    pub fn from_value(raw: &Value) -> Self {
        Self {
            update_id: raw.get("update_id").and_then(Value::as_i64),
            message: raw.get("message").and_then(IncomingMessage::from_value),
        }
    }
}

impl IncomingMessage {
    pub fn from_value(raw: &Value) -> Option<Self> {
        let chat_id = raw.get("chat")?.get("id")?.as_i64()?;
        let message_id = i32::try_from(raw.get("message_id")?.as_i64()?).ok()?;
        let text = raw.get("text").and_then(Value::as_str).map(str::to_owned);
        let sender = user_id(raw.get("from"));

        // Legacy single-participant field first, then the current array form.
        let mut joined: Vec<UserId> = user_id(raw.get("new_chat_participant"))
            .into_iter()
            .collect();
        if let Some(members) = raw.get("new_chat_members").and_then(Value::as_array) {
            for id in members.iter().filter_map(|m| user_id(Some(m))) {
                if !joined.contains(&id) {
                    joined.push(id);
                }
            }
        }
        let left = user_id(raw.get("left_chat_participant"))
            .or_else(|| user_id(raw.get("left_chat_member")));

        Some(Self {
            chat_id: ChatId(chat_id),
            message_id: MessageId(message_id),
            text,
            sender,
            joined,
            left,
            raw: raw.clone(),
        })
    }

    /// How this message changes `who`'s membership, if at all. A join wins over a leave.
    pub fn membership_of(&self, who: UserId) -> Option<Membership> {
        if self.joined.contains(&who) {
            return Some(Membership::Joined);
        }
        if self.left == Some(who) {
            return Some(Membership::Left);
        }
        None
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

fn user_id(v: Option<&Value>) -> Option<UserId> {
    v?.get("id")?.as_i64().map(UserId)
}
