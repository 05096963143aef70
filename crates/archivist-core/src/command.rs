//! Classification of message text into bot commands.
//!
//! Matching is byte-exact: no case folding, no whitespace trimming.

/// What a message's text asks the bot to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Get,
    Delete,
    DeleteConfirm,
    Help,
    PlainText,
}

/// Phrase that follows the bot's mention to confirm a `/delete`.
pub const CONFIRM_PHRASE: &str = "YES I AM SURE";

/// Classify `raw` for the bot named `bot_username` (without the leading `@`).
pub fn resolve(raw: &str, bot_username: &str) -> Command {
    // The confirmation carries the mention as a required leading token, so it is
    // matched against the raw text rather than the suffix-stripped text.
    if is_delete_confirmation(raw, bot_username) {
        return Command::DeleteConfirm;
    }

    match strip_self_mention(raw, bot_username) {
        "/get" => Command::Get,
        "/delete" => Command::Delete,
        "/help" => Command::Help,
        _ => Command::PlainText,
    }
}

/// Drop a trailing `@bot_username`, as Telegram appends in multi-bot groups (`/help@my_bot`).
pub fn strip_self_mention<'a>(text: &'a str, bot_username: &str) -> &'a str {
    text.strip_suffix(bot_username)
        .and_then(|rest| rest.strip_suffix('@'))
        .unwrap_or(text)
}

/// `true` only for the exact text `@bot_username YES I AM SURE`.
pub fn is_delete_confirmation(text: &str, bot_username: &str) -> bool {
    confirmation_text(bot_username) == text
}

/// The text users must send to confirm deletion.
pub fn confirmation_text(bot_username: &str) -> String {
    format!("@{bot_username} {CONFIRM_PHRASE}")
}
