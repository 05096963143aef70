//! Per-message decision table and its side effects.
//!
//! `decide` is pure: given a message, who the bot is and whether the startup
//! backlog is still draining, it returns what to do. `Dispatcher::handle` carries
//! that out against the archive and messaging ports.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    archive::ArchiveStore,
    command::{self, Command},
    domain::BotIdentity,
    messaging::{port::MessagingPort, texts},
    updates::{IncomingMessage, Membership},
};

/// The reply-side effect of one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    /// The bot itself was added to the chat.
    Welcome,
    /// The bot itself was removed from the chat.
    LeftChat,
    SendExport,
    AskDeleteConfirmation,
    DeleteArchive,
    SendHelp,
    Nothing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub reaction: Reaction,
    /// Whether the raw message is appended to the chat's archive after the reaction.
    pub archive: bool,
}

impl Decision {
    const fn new(reaction: Reaction, archive: bool) -> Self {
        Self { reaction, archive }
    }
}

/// Decide what a message triggers.
///
/// While `first_run` is set, command replies are suppressed but the message is still
/// archived, except a delete confirmation, which is never archived. The welcome is
/// sent regardless of `first_run`.
pub fn decide(msg: &IncomingMessage, me: &BotIdentity, first_run: bool) -> Decision {
    match msg.membership_of(me.id) {
        Some(Membership::Joined) => return Decision::new(Reaction::Welcome, false),
        Some(Membership::Left) => return Decision::new(Reaction::LeftChat, false),
        None => {}
    }

    let reply = |r: Reaction| if first_run { Reaction::Nothing } else { r };

    match command::resolve(msg.text_or_empty(), &me.username) {
        Command::Get => Decision::new(reply(Reaction::SendExport), true),
        Command::Delete => Decision::new(reply(Reaction::AskDeleteConfirmation), true),
        Command::DeleteConfirm => Decision::new(reply(Reaction::DeleteArchive), false),
        Command::Help => Decision::new(reply(Reaction::SendHelp), true),
        Command::PlainText => Decision::new(Reaction::Nothing, true),
    }
}

/// Applies decisions. Every side effect is best-effort: failures are logged and
/// never stop processing of the page.
#[derive(Clone)]
pub struct Dispatcher {
    me: BotIdentity,
    archive: Arc<dyn ArchiveStore>,
    messenger: Arc<dyn MessagingPort>,
}

impl Dispatcher {
    pub fn new(
        me: BotIdentity,
        archive: Arc<dyn ArchiveStore>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            me,
            archive,
            messenger,
        }
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.me
    }

    pub async fn handle(&self, msg: &IncomingMessage, first_run: bool) -> Decision {
        let decision = decide(msg, &self.me, first_run);
        let chat_id = msg.chat_id;

        match decision.reaction {
            Reaction::Welcome => {
                info!(chat_id = chat_id.0, "joined chat");
                self.reply(msg, &texts::welcome(&self.me.username), false)
                    .await;
            }
            Reaction::LeftChat => {
                info!(chat_id = chat_id.0, "left chat");
            }
            Reaction::SendExport => {
                info!(chat_id = chat_id.0, "/get");
                match self.archive.export(chat_id) {
                    Ok(path) => {
                        if let Err(e) = self.messenger.send_document(chat_id, &path).await {
                            warn!(chat_id = chat_id.0, error = %e, "failed to send export");
                        }
                    }
                    Err(e) => warn!(chat_id = chat_id.0, error = %e, "failed to build export"),
                }
            }
            Reaction::AskDeleteConfirmation => {
                info!(chat_id = chat_id.0, "/delete requested");
                self.reply(
                    msg,
                    &texts::delete_confirmation_request(&self.me.username),
                    true,
                )
                .await;
            }
            Reaction::DeleteArchive => {
                info!(chat_id = chat_id.0, "/delete confirmed");
                if let Err(e) = self.archive.delete(chat_id) {
                    warn!(chat_id = chat_id.0, error = %e, "failed to delete archive");
                }
                self.reply(msg, texts::DELETE_DONE, false).await;
            }
            Reaction::SendHelp => {
                info!(chat_id = chat_id.0, "/help");
                self.reply(msg, texts::HELP, false).await;
            }
            Reaction::Nothing => {}
        }

        if decision.archive {
            if let Err(e) = self.archive.append(chat_id, &msg.raw) {
                warn!(chat_id = chat_id.0, error = %e, "failed to archive message");
            }
        }

        decision
    }

    async fn reply(&self, msg: &IncomingMessage, text: &str, quote: bool) {
        let reply_to = quote.then_some(msg.message_id);
        if let Err(e) = self.messenger.send_text(msg.chat_id, text, reply_to).await {
            warn!(chat_id = msg.chat_id.0, error = %e, "failed to send reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId};
    use crate::testing::*;
    use std::path::PathBuf;

    fn msg(text: &str) -> IncomingMessage {
        text_update(1, 10, 77, text).message.unwrap()
    }

    fn setup() -> (Dispatcher, Arc<MemoryArchive>, Arc<FakeMessenger>) {
        let archive = Arc::new(MemoryArchive::default());
        let messenger = Arc::new(FakeMessenger::default());
        let d = Dispatcher::new(identity(), archive.clone(), messenger.clone());
        (d, archive, messenger)
    }

    #[test]
    fn decision_table() {
        let me = identity();
        let cases = [
            ("/get", false, Reaction::SendExport, true),
            ("/get", true, Reaction::Nothing, true),
            ("/delete", false, Reaction::AskDeleteConfirmation, true),
            ("/delete", true, Reaction::Nothing, true),
            ("@archive_bot YES I AM SURE", false, Reaction::DeleteArchive, false),
            ("@archive_bot YES I AM SURE", true, Reaction::Nothing, false),
            ("/help@archive_bot", false, Reaction::SendHelp, true),
            ("/help", true, Reaction::Nothing, true),
            ("/help@othername", false, Reaction::Nothing, true),
            ("good morning", false, Reaction::Nothing, true),
            ("good morning", true, Reaction::Nothing, true),
        ];
        for (text, first_run, reaction, archive) in cases {
            assert_eq!(
                decide(&msg(text), &me, first_run),
                Decision { reaction, archive },
                "{text:?} first_run={first_run}"
            );
        }
    }

    #[test]
    fn membership_of_self_only() {
        let me = identity();
        for first_run in [true, false] {
            let join = join_update(1, 10, BOT_ID).message.unwrap();
            assert_eq!(
                decide(&join, &me, first_run),
                Decision::new(Reaction::Welcome, false)
            );
            let leave = leave_update(2, 10, BOT_ID).message.unwrap();
            assert_eq!(
                decide(&leave, &me, first_run),
                Decision::new(Reaction::LeftChat, false)
            );
        }

        let someone_else = join_update(3, 10, 5).message.unwrap();
        assert_eq!(
            decide(&someone_else, &me, false),
            Decision::new(Reaction::Nothing, true)
        );
    }

    #[tokio::test]
    async fn get_sends_export_then_archives() {
        let (d, archive, messenger) = setup();
        d.handle(&msg("hello"), false).await;
        d.handle(&msg("/get"), false).await;

        assert_eq!(archive.exports(), vec![ChatId(10)]);
        assert_eq!(
            messenger.sent(),
            vec![Sent::Document {
                chat_id: ChatId(10),
                path: PathBuf::from("/scratch/10.zip"),
            }]
        );
        assert_eq!(archive.records(10).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_export_sends_nothing_but_still_archives() {
        let (d, archive, messenger) = setup();
        d.handle(&msg("/get"), false).await;

        assert_eq!(archive.exports(), vec![ChatId(10)]);
        assert!(messenger.sent().is_empty());
        assert_eq!(archive.appends(), vec![ChatId(10)]);
    }

    #[tokio::test]
    async fn delete_request_replies_to_triggering_message() {
        let (d, archive, messenger) = setup();
        d.handle(&msg("/delete"), false).await;

        assert_eq!(
            messenger.sent(),
            vec![Sent::Text {
                chat_id: ChatId(10),
                text: texts::delete_confirmation_request(BOT_NAME),
                reply_to: Some(MessageId(77)),
            }]
        );
        assert!(archive.deletes().is_empty());
        assert_eq!(archive.appends(), vec![ChatId(10)]);
    }

    #[tokio::test]
    async fn confirmation_deletes_and_is_not_archived() {
        let (d, archive, messenger) = setup();
        d.handle(&msg("hello"), false).await;
        d.handle(&msg("@archive_bot YES I AM SURE"), false).await;

        assert_eq!(archive.deletes(), vec![ChatId(10)]);
        assert!(archive.records(10).is_none());
        assert_eq!(archive.appends().len(), 1);
        assert_eq!(
            messenger.sent(),
            vec![Sent::Text {
                chat_id: ChatId(10),
                text: texts::DELETE_DONE.to_string(),
                reply_to: None,
            }]
        );
    }

    #[tokio::test]
    async fn suppressed_commands_have_no_side_effects_besides_archiving() {
        let (d, archive, messenger) = setup();
        for text in ["/get", "/delete", "/help", "@archive_bot YES I AM SURE"] {
            d.handle(&msg(text), true).await;
        }

        assert!(messenger.sent().is_empty());
        assert!(archive.deletes().is_empty());
        assert!(archive.exports().is_empty());
        assert_eq!(archive.records(10).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn welcome_is_sent_even_during_backlog_and_not_archived() {
        let (d, archive, messenger) = setup();
        let join = join_update(1, 10, BOT_ID).message.unwrap();
        d.handle(&join, true).await;

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Sent::Text { chat_id, text, .. } => {
                assert_eq!(*chat_id, ChatId(10));
                assert!(text.contains("@archive_bot"));
            }
            other => panic!("unexpected send: {other:?}"),
        }
        assert!(archive.appends().is_empty());
    }

    #[tokio::test]
    async fn leaving_is_silent_and_not_archived() {
        let (d, archive, messenger) = setup();
        let leave = leave_update(1, 10, BOT_ID).message.unwrap();
        d.handle(&leave, false).await;

        assert!(messenger.sent().is_empty());
        assert!(archive.appends().is_empty());
    }

    #[tokio::test]
    async fn failed_send_does_not_stop_archiving() {
        let archive = Arc::new(MemoryArchive::default());
        let messenger = Arc::new(FakeMessenger::failing());
        let d = Dispatcher::new(identity(), archive.clone(), messenger.clone());

        d.handle(&msg("/help"), false).await;

        assert_eq!(messenger.sent().len(), 1);
        assert_eq!(archive.appends(), vec![ChatId(10)]);
    }
}
