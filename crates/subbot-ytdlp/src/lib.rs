//! yt-dlp adapter (default media extraction collaborator).
//!
//! Runs `yt-dlp -J --no-playlist <url>` and maps the info JSON onto
//! [`ExtractedMedia`]. Only formats fetchable with a single HTTP GET are
//! considered, since the fetcher does not speak HLS/DASH.

use std::{cmp::Ordering, path::PathBuf, process::Stdio, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use subbot_core::{errors::Error, media::ExtractedMedia, ports::MediaExtractor, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug)]
pub struct YtDlpConfig {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug)]
pub struct YtDlpExtractor {
    cfg: YtDlpConfig,
}

impl YtDlpExtractor {
    pub fn new(cfg: YtDlpConfig) -> Self {
        Self { cfg }
    }

    fn build_args(url: &str) -> Vec<String> {
        vec![
            "-J".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--".to_string(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedMedia>> {
        let mut cmd = Command::new(&self.cfg.program);
        cmd.args(Self::build_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            Error::Resolution(format!(
                "cannot run {}: {e}",
                self.cfg.program.display()
            ))
        })?;

        let output = tokio::time::timeout(self.cfg.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Resolution("extraction timed out".to_string()))?
            .map_err(|e| Error::Resolution(format!("yt-dlp failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Resolution(error_line(&stderr).unwrap_or_else(|| {
                format!("yt-dlp exited with {}", output.status)
            })));
        }

        let info: YtInfo = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Resolution(format!("unreadable yt-dlp output: {e}")))?;
        let media = map_info(info);
        debug!(found = media.is_some(), "yt-dlp extraction finished");
        Ok(media)
    }
}

/// The most useful line of yt-dlp's stderr: the last `ERROR:` line, else the last line.
fn error_line(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
}

#[derive(Debug, Default, Deserialize)]
struct YtInfo {
    title: Option<String>,
    url: Option<String>,
    protocol: Option<String>,
    #[serde(default)]
    formats: Vec<YtFormat>,
    #[serde(default)]
    entries: Vec<Option<YtInfo>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct YtFormat {
    url: Option<String>,
    protocol: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    tbr: Option<f64>,
    abr: Option<f64>,
}

impl YtFormat {
    // A missing codec field means "unknown", not "absent".
    fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    fn direct_url(&self) -> Option<&str> {
        if !is_direct(self.protocol.as_deref()) {
            return None;
        }
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

fn is_direct(protocol: Option<&str>) -> bool {
    matches!(protocol, None | Some("http") | Some("https"))
}

fn cmp_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(0.0)
        .partial_cmp(&b.unwrap_or(0.0))
        .unwrap_or(Ordering::Equal)
}

fn by_quality(a: &&YtFormat, b: &&YtFormat) -> Ordering {
    a.height
        .unwrap_or(0)
        .cmp(&b.height.unwrap_or(0))
        .then_with(|| cmp_f64(a.tbr, b.tbr))
}

fn map_info(info: YtInfo) -> Option<ExtractedMedia> {
    // Playlist-shaped results: use the first real entry.
    if info.formats.is_empty() && info.url.is_none() {
        let entry = info.entries.into_iter().flatten().next()?;
        return map_info(entry);
    }

    let combined: Vec<&YtFormat> = info
        .formats
        .iter()
        .filter(|f| f.has_video() && f.has_audio() && f.direct_url().is_some())
        .collect();

    let top_level = info
        .url
        .as_deref()
        .filter(|u| !u.is_empty() && is_direct(info.protocol.as_deref()));

    let high = combined
        .iter()
        .copied()
        .max_by(by_quality)
        .and_then(|f| f.direct_url())
        .or(top_level)
        .map(str::to_string);

    let low = combined
        .iter()
        .copied()
        .min_by(by_quality)
        .and_then(|f| f.direct_url())
        .map(str::to_string);

    let audio = info
        .formats
        .iter()
        .filter(|f| !f.has_video() && f.has_audio() && f.direct_url().is_some())
        .max_by(|a, b| cmp_f64(a.abr.or(a.tbr), b.abr.or(b.tbr)))
        .and_then(|f| f.direct_url())
        .map(str::to_string);

    if high.is_none() && audio.is_none() {
        return None;
    }

    Some(ExtractedMedia {
        title: info.title,
        high,
        low,
        audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(v: serde_json::Value) -> YtInfo {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn picks_best_combined_low_and_audio_only() {
        let media = map_info(info(json!({
            "title": "Clip",
            "formats": [
                {"url": "https://cdn/360.mp4", "protocol": "https", "vcodec": "avc1", "acodec": "mp4a", "height": 360, "tbr": 500.0},
                {"url": "https://cdn/720.mp4", "protocol": "https", "vcodec": "avc1", "acodec": "mp4a", "height": 720, "tbr": 1500.0},
                {"url": "https://cdn/1080.m3u8", "protocol": "m3u8_native", "vcodec": "avc1", "acodec": "mp4a", "height": 1080},
                {"url": "https://cdn/1080-video-only.mp4", "protocol": "https", "vcodec": "avc1", "acodec": "none", "height": 1080},
                {"url": "https://cdn/audio-lo.m4a", "protocol": "https", "vcodec": "none", "acodec": "mp4a", "abr": 48.0},
                {"url": "https://cdn/audio-hi.m4a", "protocol": "https", "vcodec": "none", "acodec": "mp4a", "abr": 128.0}
            ]
        })))
        .unwrap();

        assert_eq!(media.title.as_deref(), Some("Clip"));
        assert_eq!(media.high.as_deref(), Some("https://cdn/720.mp4"));
        assert_eq!(media.low.as_deref(), Some("https://cdn/360.mp4"));
        assert_eq!(media.audio.as_deref(), Some("https://cdn/audio-hi.m4a"));
    }

    #[test]
    fn direct_file_pages_use_top_level_url() {
        let media = map_info(info(json!({
            "title": "file",
            "url": "https://example.com/file.mp4",
            "protocol": "https"
        })))
        .unwrap();
        assert_eq!(media.high.as_deref(), Some("https://example.com/file.mp4"));
        assert!(media.audio.is_none());
    }

    #[test]
    fn playlist_uses_first_entry() {
        let media = map_info(info(json!({
            "_type": "playlist",
            "entries": [null, {"url": "https://cdn/first.mp4"}]
        })))
        .unwrap();
        assert_eq!(media.high.as_deref(), Some("https://cdn/first.mp4"));
    }

    #[test]
    fn stream_only_results_are_not_downloadable() {
        assert!(map_info(info(json!({
            "formats": [{"url": "https://cdn/x.m3u8", "protocol": "m3u8_native"}]
        })))
        .is_none());
        assert!(map_info(info(json!({}))).is_none());
    }

    #[test]
    fn error_line_prefers_error_prefix() {
        let stderr = "WARNING: something\nERROR: Unsupported URL: https://x\n";
        assert_eq!(
            error_line(stderr).as_deref(),
            Some("Unsupported URL: https://x")
        );
        assert_eq!(error_line("just noise\n").as_deref(), Some("just noise"));
        assert_eq!(error_line(""), None);
    }

    #[test]
    fn url_is_passed_after_option_terminator() {
        let args = YtDlpExtractor::build_args("-oops");
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "-oops");
    }

    #[tokio::test]
    async fn missing_binary_is_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let ex = YtDlpExtractor::new(YtDlpConfig {
            program: dir.path().join("no-such-yt-dlp"),
            timeout: Duration::from_secs(5),
        });
        let err = ex.extract("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
        assert!(err.to_string().starts_with("cannot run"));
    }
}
