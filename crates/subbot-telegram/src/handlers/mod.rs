//! Telegram update handlers.
//!
//! Each handler only translates a teloxide update into a core [`IncomingUpdate`]
//! and hands it to the tenant's [`BotSession`]; the session owns all behaviour.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use subbot_core::session::BotSession;

mod callback;
mod text;

pub async fn handle_callback(q: CallbackQuery, session: Arc<BotSession>) -> ResponseResult<()> {
    session.handle(callback::to_update(&q)).await;
    Ok(())
}

/// The bot's own @username, known once getMe succeeded.
#[derive(Clone, Debug, Default)]
pub struct BotIdentity {
    pub username: Option<String>,
}

pub async fn handle_message(
    msg: Message,
    session: Arc<BotSession>,
    identity: BotIdentity,
) -> ResponseResult<()> {
    if let Some(update) = text::to_update(&msg, identity.username.as_deref()) {
        session.handle(update).await;
    }
    Ok(())
}
