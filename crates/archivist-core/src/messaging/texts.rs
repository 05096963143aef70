//! User-facing reply texts.

use crate::command::confirmation_text;

pub fn welcome(bot_username: &str) -> String {
    format!(
        "Hello. I'm @{bot_username}. My purpose is to record this chat, so you can later use \
'/get' to get all messages sent in here for a personal 'backup'. Join the channel \
@{bot_username}_news to stay up to date with the bot's development and new features. \
You can use the command /delete to make me delete all records of this chat. \
I'll just sit here and be quiet now. Just ignore me. ;-)"
    )
}

pub fn delete_confirmation_request(bot_username: &str) -> String {
    format!(
        "You are about to delete my archive of this chat. This cannot be undone. \
If you are really sure you want to go on, send '{}'.",
        confirmation_text(bot_username)
    )
}

pub const DELETE_DONE: &str = "Okay, I've deleted my archive for this chat. Remember to remove \
me from this chat if you don't want me to start collecting a new archive.";

pub const HELP: &str = "/get - Request my recordings of this chat as ZIP file.\n\
/delete - Make me delete my recordings of this chat.\n\
/help - This help.";
