use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{domain::BotToken, errors::Error, Result};

/// Which extraction collaborator resolves page URLs into media URLs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractorKind {
    YtDlp,
    Http { endpoint: String },
}

/// Typed process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Status endpoint
    pub port: u16,

    // Tenants
    pub bots_file: PathBuf,

    // Media
    pub extractor: ExtractorKind,
    pub ytdlp_path: PathBuf,
    pub fetch_timeout: Duration,
    pub caption_signature: Option<String>,

    // Scratch directory
    pub scratch_dir: PathBuf,
    pub keep_downloads: bool,
    pub scratch_max_age: Option<Duration>,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let cfg = Self::from_lookup(|key| env::var(key).ok())?;

        // Scratch dir must exist before the first fetch.
        fs::create_dir_all(&cfg.scratch_dir)?;

        Ok(cfg)
    }

    /// Build a config from an arbitrary variable source (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);
        let get_u64 = |key: &str| get(key).and_then(|s| s.trim().parse::<u64>().ok());
        let get_bool = |key: &str| get(key).map(|s| parse_bool(&s));

        let port = get("PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(Self::DEFAULT_PORT);

        let bots_file = PathBuf::from(get("BOTS_FILE").unwrap_or_else(|| "./bots.json".to_string()));

        let extractor = match get("EXTRACTOR")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("ytdlp") | Some("yt-dlp") => ExtractorKind::YtDlp,
            Some("http") => {
                let endpoint = get("EXTRACTOR_URL").ok_or_else(|| {
                    Error::Config("EXTRACTOR_URL is required when EXTRACTOR=http".to_string())
                })?;
                ExtractorKind::Http { endpoint }
            }
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown EXTRACTOR '{other}' (expected 'ytdlp' or 'http')"
                )))
            }
        };

        let ytdlp_path = PathBuf::from(get("YTDLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()));
        let fetch_timeout = Duration::from_secs(get_u64("FETCH_TIMEOUT_SECS").unwrap_or(300));
        let caption_signature = get("CAPTION_SIGNATURE");

        let scratch_dir = PathBuf::from(
            get("DOWNLOAD_PATH").unwrap_or_else(|| "/tmp/subbot-downloads".to_string()),
        );
        let keep_downloads = get_bool("KEEP_DOWNLOADS").unwrap_or(false);
        let scratch_max_age = match get_u64("SCRATCH_MAX_AGE_SECS").unwrap_or(3600) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            port,
            bots_file,
            extractor,
            ytdlp_path,
            fetch_timeout,
            caption_signature,
            scratch_dir,
            keep_downloads,
            scratch_max_age,
        })
    }
}

/// One tenant entry from the bots file.
#[derive(Clone, Debug)]
pub struct BotEntry {
    pub token: BotToken,
    pub name: String,
}

#[derive(Deserialize)]
struct BotsFile {
    #[serde(default)]
    bots: Vec<RawBotEntry>,
}

#[derive(Deserialize)]
struct RawBotEntry {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Read the startup bot list.
///
/// `Ok(None)` means the file does not exist (not an error: the process runs with no
/// sessions). Entries without a token are dropped; a missing name becomes `"Bot"`.
pub fn load_bots(path: &Path) -> Result<Option<Vec<BotEntry>>> {
    if !path.exists() {
        return Ok(None);
    }
    let txt = fs::read_to_string(path)?;
    parse_bots(&txt).map(Some)
}

pub fn parse_bots(txt: &str) -> Result<Vec<BotEntry>> {
    let file: BotsFile = serde_json::from_str(txt)?;
    Ok(file
        .bots
        .into_iter()
        .filter_map(|raw| {
            let token = raw.token.and_then(non_empty)?;
            let name = raw
                .name
                .and_then(non_empty)
                .unwrap_or_else(|| "Bot".to_string());
            Some(BotEntry {
                token: BotToken::new(token.trim()),
                name,
            })
        })
        .collect())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
