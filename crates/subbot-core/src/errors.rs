/// Core error type for the bot supervisor.
///
/// Adapter crates map their specific errors into this type so a chat
/// interaction can turn any failure into one user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),

    /// User text is not a plausible link.
    #[error("{0}")]
    Validation(String),

    /// The extraction collaborator produced nothing we can download.
    #[error("{0}")]
    Resolution(String),

    /// Network or disk failure while retrieving media.
    #[error("{0}")]
    Fetch(String),

    /// Transport failure while sending the artifact back.
    #[error("upload failed: {0}")]
    Upload(String),

    /// A stale session could not be stopped cleanly before replacement.
    #[error("failed to stop previous session: {0}")]
    SessionReplace(String),
}

pub type Result<T> = std::result::Result<T, Error>;
