use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId},
    Result,
};

/// Outbound messaging port.
///
/// Every send is silent (no notification). Callers treat failures as best-effort:
/// a failed reply never stops the engine.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str, reply_to: Option<MessageId>)
        -> Result<()>;

    /// Upload the file at `path` as a document attachment.
    async fn send_document(&self, chat_id: ChatId, path: &Path) -> Result<()>;
}
