use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{
    errors::Error,
    media::{DownloadArtifact, MediaKind},
    ports::MediaDownloader,
    Result,
};

static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Downloads direct media URLs into the shared scratch directory.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    http: reqwest::Client,
    scratch_dir: PathBuf,
}

impl HttpFetcher {
    pub fn new(scratch_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            scratch_dir: scratch_dir.into(),
        })
    }

    async fn download_to(&self, media_url: &str, part: &Path) -> Result<u64> {
        let mut resp = self
            .http
            .get(media_url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("media server responded with {status}")));
        }

        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| Error::Fetch(format!("cannot create {}: {e}", part.display())))?;

        let mut written = 0u64;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| Error::Fetch(format!("download interrupted: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::Fetch(format!("write failed: {e}")))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Error::Fetch(format!("write failed: {e}")))?;

        Ok(written)
    }
}

#[async_trait]
impl MediaDownloader for HttpFetcher {
    async fn fetch(&self, media_url: &str, kind: MediaKind) -> Result<DownloadArtifact> {
        let local_path = self.scratch_dir.join(artifact_file_name(kind));
        let part = part_path(&local_path);

        let written = match self.download_to(media_url, &part).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };

        // Readers only ever see complete files.
        if let Err(e) = tokio::fs::rename(&part, &local_path).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(Error::Fetch(format!("cannot finalize download: {e}")));
        }

        debug!(path = %local_path.display(), bytes = written, "media fetched");

        Ok(DownloadArtifact { local_path, kind })
    }
}

/// `media_<unix-nanos>_<seq>.<ext>`; the sequence keeps same-instant fetches apart.
pub fn artifact_file_name(kind: MediaKind) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("media_{nanos}_{seq}.{}", kind.extension())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
