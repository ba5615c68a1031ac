use std::{
    path::Path,
    time::{Duration, SystemTime},
};

use tracing::{debug, warn};

use crate::Result;

/// Best-effort removal of an artifact after its upload attempt.
pub async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "artifact removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove artifact"),
    }
}

/// Delete regular files in `dir` whose mtime is older than `max_age`.
///
/// Returns the number of files removed. Files that vanish mid-sweep are skipped.
pub async fn sweep_stale(dir: &Path, max_age: Duration) -> Result<usize> {
    sweep_stale_at(dir, max_age, SystemTime::now()).await
}

pub async fn sweep_stale_at(dir: &Path, max_age: Duration, now: SystemTime) -> Result<usize> {
    let mut removed = 0usize;
    let mut rd = tokio::fs::read_dir(dir).await?;

    while let Some(ent) = rd.next_entry().await? {
        let Ok(md) = ent.metadata().await else {
            continue;
        };
        if !md.is_file() {
            continue;
        }
        let Ok(modified) = md.modified() else {
            continue;
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age < max_age {
            continue;
        }
        match tokio::fs::remove_file(ent.path()).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %ent.path().display(), error = %e, "sweep failed to remove file"),
        }
    }

    Ok(removed)
}
