use std::sync::Arc;

use tracing::debug;

use crate::{
    errors::Error,
    media::{ExtractedMedia, MediaFormat, ResolvedMedia},
    ports::MediaExtractor,
    Result,
};

pub const NO_MEDIA_FOUND: &str = "No downloadable video found";
pub const NO_MEDIA_URL: &str = "No media URL found!";

/// Picks a direct media URL for a page, delegating extraction to a collaborator.
#[derive(Clone)]
pub struct MediaResolver {
    extractor: Arc<dyn MediaExtractor>,
}

impl MediaResolver {
    pub fn new(extractor: Arc<dyn MediaExtractor>) -> Self {
        Self { extractor }
    }

    pub async fn resolve(&self, url: &str, format: MediaFormat) -> Result<ResolvedMedia> {
        let extracted = self
            .extractor
            .extract(url)
            .await?
            .ok_or_else(|| Error::Resolution(NO_MEDIA_FOUND.to_string()))?;

        let media_url = select_stream(&extracted, format)
            .ok_or_else(|| Error::Resolution(NO_MEDIA_URL.to_string()))?;

        debug!(?format, title = ?extracted.title, "resolved media stream");

        Ok(ResolvedMedia {
            media_url: media_url.to_string(),
            kind: format.kind(),
        })
    }
}

/// Audio requests prefer the audio-only stream and fall back to the best stream.
pub fn select_stream(media: &ExtractedMedia, format: MediaFormat) -> Option<&str> {
    fn usable(s: &Option<String>) -> Option<&str> {
        s.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    match format {
        MediaFormat::Audio => usable(&media.audio).or_else(|| usable(&media.high)),
        MediaFormat::Best => usable(&media.high),
    }
}
