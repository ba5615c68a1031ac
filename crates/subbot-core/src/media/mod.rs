//! Media retrieval: page URL -> direct media URL -> file in the scratch directory.

pub mod fetcher;
pub mod resolver;
pub mod scratch;

use std::path::PathBuf;

/// What the user asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    Audio,
    Best,
}

impl MediaFormat {
    /// Anything other than `"audio"` means the best available stream.
    pub fn from_choice(choice: &str) -> Self {
        if choice.eq_ignore_ascii_case("audio") {
            Self::Audio
        } else {
            Self::Best
        }
    }

    pub fn kind(self) -> MediaKind {
        match self {
            Self::Audio => MediaKind::Audio,
            Self::Best => MediaKind::Video,
        }
    }
}

/// How a resolved stream is delivered back to the chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }
}

/// Stream URLs reported by an extraction collaborator for one page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedMedia {
    pub title: Option<String>,
    /// Highest-quality stream.
    pub high: Option<String>,
    pub low: Option<String>,
    /// Dedicated audio-only stream.
    pub audio: Option<String>,
}

/// A direct, fetchable media URL chosen for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub media_url: String,
    pub kind: MediaKind,
}

/// A fetched file waiting to be uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub local_path: PathBuf,
    pub kind: MediaKind,
}
