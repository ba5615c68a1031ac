use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{InlineKeyboard, MessagingCapabilities},
    Result,
};

/// Outbound side of one tenant's chat client.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Send `text` with an inline keyboard, optionally as a reply to `reply_to`.
    async fn send_choice(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
        reply_to: Option<MessageRef>,
    ) -> Result<MessageRef>;

    async fn send_audio(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<MessageRef>;

    async fn send_video(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<MessageRef>;

    /// Acknowledge a button press so the client stops its progress indicator.
    async fn answer_callback_query(&self, callback_id: &str) -> Result<()>;
}
