//! In-memory fakes for the ports, shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    archive::ArchiveStore,
    domain::{BotIdentity, ChatId, MessageId},
    errors::Error,
    messaging::port::MessagingPort,
    updates::{Update, UpdateSource},
    Result,
};

pub const BOT_ID: i64 = 4242;
pub const BOT_NAME: &str = "archive_bot";

pub fn identity() -> BotIdentity {
    BotIdentity::new(BOT_ID, BOT_NAME)
}

/// A `message` update as Telegram would send it.
pub fn text_update(update_id: i64, chat_id: i64, message_id: i64, text: &str) -> Update {
    Update::from_value(&json!({
        "update_id": update_id,
        "message": {
            "message_id": message_id,
            "from": { "id": 1, "is_bot": false, "first_name": "Alice" },
            "chat": { "id": chat_id, "type": "group" },
            "date": 1700000000,
            "text": text
        }
    }))
}

pub fn join_update(update_id: i64, chat_id: i64, who: i64) -> Update {
    Update::from_value(&json!({
        "update_id": update_id,
        "message": {
            "message_id": 1,
            "chat": { "id": chat_id, "type": "group" },
            "new_chat_participant": { "id": who },
            "new_chat_members": [{ "id": who }]
        }
    }))
}

pub fn leave_update(update_id: i64, chat_id: i64, who: i64) -> Update {
    Update::from_value(&json!({
        "update_id": update_id,
        "message": {
            "message_id": 2,
            "chat": { "id": chat_id, "type": "group" },
            "left_chat_participant": { "id": who }
        }
    }))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        reply_to: Option<MessageId>,
    },
    Document {
        chat_id: ChatId,
        path: PathBuf,
    },
}

#[derive(Default)]
pub struct FakeMessenger {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl FakeMessenger {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
            reply_to,
        });
        if self.fail {
            return Err(Error::Transport("send failed".into()));
        }
        Ok(())
    }

    async fn send_document(&self, chat_id: ChatId, path: &Path) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Document {
            chat_id,
            path: path.to_path_buf(),
        });
        if self.fail {
            return Err(Error::Transport("send failed".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryArchive {
    chats: Mutex<HashMap<i64, Vec<Value>>>,
    appends: Mutex<Vec<ChatId>>,
    deletes: Mutex<Vec<ChatId>>,
    exports: Mutex<Vec<ChatId>>,
}

impl MemoryArchive {
    pub fn records(&self, chat_id: i64) -> Option<Vec<Value>> {
        self.chats.lock().unwrap().get(&chat_id).cloned()
    }

    pub fn appends(&self) -> Vec<ChatId> {
        self.appends.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<ChatId> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn exports(&self) -> Vec<ChatId> {
        self.exports.lock().unwrap().clone()
    }
}

impl ArchiveStore for MemoryArchive {
    fn append(&self, chat_id: ChatId, record: &Value) -> Result<()> {
        self.appends.lock().unwrap().push(chat_id);
        self.chats
            .lock()
            .unwrap()
            .entry(chat_id.0)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn delete(&self, chat_id: ChatId) -> Result<()> {
        self.deletes.lock().unwrap().push(chat_id);
        self.chats.lock().unwrap().remove(&chat_id.0);
        Ok(())
    }

    fn export(&self, chat_id: ChatId) -> Result<PathBuf> {
        self.exports.lock().unwrap().push(chat_id);
        if !self.chats.lock().unwrap().contains_key(&chat_id.0) {
            return Err(Error::ArchiveMissing {
                chat_id: chat_id.0,
                path: PathBuf::from(format!("{}.json", chat_id.0)),
            });
        }
        Ok(PathBuf::from(format!("/scratch/{}.zip", chat_id.0)))
    }
}

/// Serves scripted pages in order, then empty pages forever.
#[derive(Default)]
pub struct ScriptedSource {
    pages: Mutex<VecDeque<Result<Vec<Update>>>>,
    polls: Mutex<Vec<(i64, Duration, u32)>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Result<Vec<Update>>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            polls: Mutex::new(Vec::new()),
        }
    }

    /// `(offset, timeout, limit)` of every poll made so far.
    pub fn polls(&self) -> Vec<(i64, Duration, u32)> {
        self.polls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn poll(&self, offset: i64, timeout: Duration, limit: u32) -> Result<Vec<Update>> {
        self.polls.lock().unwrap().push((offset, timeout, limit));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
