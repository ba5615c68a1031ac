use async_trait::async_trait;

use crate::{
    domain::BotToken,
    media::{DownloadArtifact, ExtractedMedia, MediaKind},
    Result,
};

/// External extraction collaborator (yt-dlp, an HTTP resolver service, ...).
///
/// `Ok(None)` means the collaborator ran fine but found nothing downloadable.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedMedia>>;
}

/// Retrieves a direct media URL into a local file.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn fetch(&self, media_url: &str, kind: MediaKind) -> Result<DownloadArtifact>;
}

/// A running long-poll loop for one token.
#[async_trait]
pub trait PollingHandle: Send + Sync {
    /// Stop polling. After this returns (even with an error) the loop must no longer poll.
    async fn stop(&mut self) -> Result<()>;
}

/// Starts a polling session for a token (the Telegram adapter in production).
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, token: &BotToken, name: &str) -> Result<Box<dyn PollingHandle>>;
}
