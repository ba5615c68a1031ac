use teloxide::types::Message;

use subbot_core::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::{Command, IncomingUpdate, TextMessage},
};

/// Lowercase command name of `/cmd@botname args`.
///
/// `None` when the command is addressed to a different bot. Without a known
/// `username` every suffix is accepted.
pub(crate) fn parse_command(text: &str, username: Option<&str>) -> Option<String> {
    let first = text
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_start_matches('/');

    let (cmd, target) = match first.split_once('@') {
        Some((cmd, target)) => (cmd, Some(target)),
        None => (first, None),
    };
    if let (Some(target), Some(me)) = (target, username) {
        if !target.eq_ignore_ascii_case(me) {
            return None;
        }
    }

    Some(cmd.to_lowercase())
}

/// Messages without text (stickers, photos, service messages) produce no update.
pub(crate) fn to_update(msg: &Message, username: Option<&str>) -> Option<IncomingUpdate> {
    let text = msg.text()?;
    let chat_id = ChatId(msg.chat.id.0);

    if text.trim_start().starts_with('/') {
        let name = parse_command(text, username)?;
        return Some(IncomingUpdate::Command(Command { chat_id, name }));
    }

    Some(IncomingUpdate::Text(TextMessage {
        chat_id,
        message: MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        },
        text: text.to_string(),
    }))
}
