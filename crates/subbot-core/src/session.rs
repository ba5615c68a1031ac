//! One tenant's chat logic.
//!
//! Per chat the flow is `Idle -> AwaitingFormatChoice -> Downloading -> Idle`, but
//! only `Downloading` exists as running code: the format choice travels inside the
//! button payload (see [`crate::choice`]), so the session keeps no per-chat state.
//! Chats never share anything but the scratch directory.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, info, warn};

use crate::{
    choice::{self, PendingSelection},
    domain::ChatId,
    errors::Error,
    formatting::{escape_html, truncate_chars},
    media::{resolver::MediaResolver, scratch, DownloadArtifact, MediaKind},
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, Command, IncomingUpdate, TextMessage},
    },
    ports::MediaDownloader,
    Result,
};

pub const INVALID_LINK: &str = "⚠️ Please send a valid video link.";
pub const SELECT_FORMAT: &str = "Select format:";
pub const DOWNLOADING: &str = "⏬ Downloading, please wait...";
pub const DOWNLOAD_FAILED: &str = "❌ Download failed.";
pub const REQUEST_EXPIRED: &str = "⚠️ This request has expired. Please send the link again.";

const GREETING_COMMAND: &str = "start";
const MAX_ERROR_LEN: usize = 200;
const SEEN_CALLBACKS_CAP: u64 = 1024;

/// Behaviour switches shared by every session.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub keep_downloads: bool,
    pub caption_signature: Option<String>,
}

/// Media collaborators shared by every session.
#[derive(Clone)]
pub struct SessionDeps {
    pub resolver: MediaResolver,
    pub downloader: Arc<dyn MediaDownloader>,
    pub options: SessionOptions,
}

pub struct BotSession {
    name: String,
    messenger: Arc<dyn MessagingPort>,
    deps: SessionDeps,
    // Callback ids that already started a download.
    seen: Cache<String, ()>,
}

impl BotSession {
    pub fn new(name: impl Into<String>, messenger: Arc<dyn MessagingPort>, deps: SessionDeps) -> Self {
        Self {
            name: name.into(),
            messenger,
            deps,
            seen: Cache::builder()
                .max_capacity(SEEN_CALLBACKS_CAP)
                .build(),
        }
    }

    /// Handle one incoming update. Every failure ends as a chat message or a log line.
    pub async fn handle(&self, update: IncomingUpdate) {
        match update {
            IncomingUpdate::Command(cmd) => self.on_command(cmd).await,
            IncomingUpdate::Text(msg) => self.on_text(msg).await,
            IncomingUpdate::Callback(q) => self.on_callback(q).await,
        }
    }

    async fn on_command(&self, cmd: Command) {
        if cmd.name != GREETING_COMMAND {
            return;
        }
        let html = format!(
            "🎉 <b>Welcome to {}!</b>\nSend me any video link to download 🎬 or 🎵",
            escape_html(&self.name)
        );
        self.say(cmd.chat_id, &html).await;
    }

    async fn on_text(&self, msg: TextMessage) {
        let text = msg.text.trim();
        if text.is_empty() || text.starts_with('/') {
            return;
        }

        let link = match validate_link(text) {
            Ok(link) => link,
            Err(e) => {
                debug!(bot = %self.name, chat_id = msg.chat_id.0, "rejected non-link text");
                self.say(msg.chat_id, &e.to_string()).await;
                return;
            }
        };

        let max_len = self.messenger.capabilities().max_callback_data_len;
        let keyboard = choice::format_keyboard(link, max_len);
        if let Err(e) = self
            .messenger
            .send_choice(msg.chat_id, SELECT_FORMAT, keyboard, Some(msg.message))
            .await
        {
            warn!(bot = %self.name, chat_id = msg.chat_id.0, error = %e, "failed to send format choice");
        }
    }

    async fn on_callback(&self, q: CallbackQuery) {
        // Ack first so the client stops its spinner, duplicates included.
        if let Err(e) = self
            .messenger
            .answer_callback_query(&q.callback_id)
            .await
        {
            warn!(bot = %self.name, error = %e, "failed to answer callback query");
        }

        let Some(chat_id) = q.chat_id else {
            return;
        };

        if !self.first_delivery(&q.callback_id).await {
            debug!(bot = %self.name, chat_id = chat_id.0, "duplicate callback ignored");
            return;
        }

        let Some(selection) = choice::decode(&q.data, q.reply_to_text.as_deref()) else {
            self.say(chat_id, REQUEST_EXPIRED).await;
            return;
        };

        self.say(chat_id, DOWNLOADING).await;
        self.download_and_deliver(chat_id, &selection).await;
    }

    async fn download_and_deliver(&self, chat_id: ChatId, selection: &PendingSelection) {
        info!(
            bot = %self.name,
            chat_id = chat_id.0,
            url = %selection.url,
            format = ?selection.format,
            "download requested"
        );

        let artifact = match self.retrieve(selection).await {
            Ok(a) => a,
            Err(e) => {
                warn!(bot = %self.name, chat_id = chat_id.0, error = %e, "download failed");
                self.say_error(chat_id, &e).await;
                return;
            }
        };

        if !tokio::fs::try_exists(&artifact.local_path)
            .await
            .unwrap_or(false)
        {
            warn!(bot = %self.name, path = %artifact.local_path.display(), "artifact missing after fetch");
            self.say(chat_id, DOWNLOAD_FAILED).await;
            return;
        }

        if let Err(e) = self.deliver(chat_id, &artifact).await {
            warn!(bot = %self.name, chat_id = chat_id.0, error = %e, "upload failed");
            self.say_error(chat_id, &e).await;
        } else {
            info!(bot = %self.name, chat_id = chat_id.0, kind = ?artifact.kind, "media delivered");
        }

        if !self.deps.options.keep_downloads {
            scratch::remove_artifact(&artifact.local_path).await;
        }
    }

    async fn retrieve(&self, selection: &PendingSelection) -> Result<DownloadArtifact> {
        let resolved = self
            .deps
            .resolver
            .resolve(&selection.url, selection.format)
            .await?;
        self.deps
            .downloader
            .fetch(&resolved.media_url, resolved.kind)
            .await
    }

    async fn deliver(&self, chat_id: ChatId, artifact: &DownloadArtifact) -> Result<()> {
        let caption = self.caption(artifact.kind);
        let sent = match artifact.kind {
            MediaKind::Audio => {
                self.messenger
                    .send_audio(chat_id, &artifact.local_path, &caption)
                    .await
            }
            MediaKind::Video => {
                self.messenger
                    .send_video(chat_id, &artifact.local_path, &caption)
                    .await
            }
        };
        sent.map(|_| ()).map_err(|e| match e {
            Error::Upload(_) => e,
            other => Error::Upload(other.to_string()),
        })
    }

    fn caption(&self, kind: MediaKind) -> String {
        let base = match kind {
            MediaKind::Audio => "✅ Audio Ready",
            MediaKind::Video => "✅ Video Ready",
        };
        match &self.deps.options.caption_signature {
            Some(sig) => format!("{base} by {sig}"),
            None => base.to_string(),
        }
    }

    /// `true` the first time `callback_id` is seen; the check and insert are one step.
    async fn first_delivery(&self, callback_id: &str) -> bool {
        self.seen
            .entry(callback_id.to_string())
            .or_insert(())
            .await
            .is_fresh()
    }

    async fn say(&self, chat_id: ChatId, html: &str) {
        if let Err(e) = self.messenger.send_html(chat_id, html).await {
            warn!(bot = %self.name, chat_id = chat_id.0, error = %e, "failed to send message");
        }
    }

    async fn say_error(&self, chat_id: ChatId, err: &Error) {
        let reason = truncate_chars(&err.to_string(), MAX_ERROR_LEN);
        self.say(chat_id, &format!("⚠️ Error: {}", escape_html(&reason)))
            .await;
    }
}

/// Accept `text` as a link to download, or explain why it is not one.
pub fn validate_link(text: &str) -> Result<&str> {
    if is_plausible_url(text) {
        Ok(text.trim())
    } else {
        Err(Error::Validation(INVALID_LINK.to_string()))
    }
}

/// Only `http://` and `https://` links with something after the scheme are worth resolving.
pub fn is_plausible_url(text: &str) -> bool {
    let text = text.trim();
    ["http://", "https://"].iter().any(|scheme| {
        text.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
            && !text[scheme.len()..].trim().is_empty()
    })
}
