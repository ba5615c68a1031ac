use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use subbot_core::{
    config::{self, Config, ExtractorKind},
    media::{fetcher::HttpFetcher, resolver::MediaResolver},
    ports::MediaExtractor,
    registry::BotRegistry,
    session::{SessionDeps, SessionOptions},
};
use subbot_http::HttpExtractor;
use subbot_telegram::router::TelegramLauncher;
use subbot_ytdlp::{YtDlpConfig, YtDlpExtractor};

mod status;
mod sweeper;

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    subbot_core::logging::init("subbot")?;

    let cfg = Config::load()?;

    let extractor: Arc<dyn MediaExtractor> = match &cfg.extractor {
        ExtractorKind::YtDlp => Arc::new(YtDlpExtractor::new(YtDlpConfig {
            program: cfg.ytdlp_path.clone(),
            ..YtDlpConfig::default()
        })),
        ExtractorKind::Http { endpoint } => {
            Arc::new(HttpExtractor::new(endpoint.clone(), RESOLVE_TIMEOUT)?)
        }
    };

    let deps = SessionDeps {
        resolver: MediaResolver::new(extractor),
        downloader: Arc::new(HttpFetcher::new(cfg.scratch_dir.clone(), cfg.fetch_timeout)?),
        options: SessionOptions {
            keep_downloads: cfg.keep_downloads,
            caption_signature: cfg.caption_signature.clone(),
        },
    };
    let registry = Arc::new(BotRegistry::new(Arc::new(TelegramLauncher::new(deps))));

    let cancel = CancellationToken::new();

    let sweeper = cfg.scratch_max_age.map(|max_age| {
        tokio::spawn(sweeper::run(
            cfg.scratch_dir.clone(),
            max_age,
            cancel.clone(),
        ))
    });

    let listener = status::bind(cfg.port).await?;
    let server = tokio::spawn(status::serve(listener, registry.clone(), cancel.clone()));

    start_configured_bots(&cfg, &registry).await;

    wait_for_shutdown().await?;

    cancel.cancel();
    registry.shutdown_all().await;
    if let Some(task) = sweeper {
        let _ = task.await;
    }
    match server.await {
        Ok(Err(e)) => error!(error = %e, "status server failed"),
        Err(e) => error!(error = %e, "status server task panicked"),
        Ok(Ok(())) => {}
    }

    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn wait_for_shutdown() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("received Ctrl-C, shutting down");
            }
            _ = terminate.recv() => info!("received SIGTERM, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("received Ctrl-C, shutting down");
    }
    Ok(())
}

/// Start every bot from the bots file. Nothing here is fatal.
async fn start_configured_bots(cfg: &Config, registry: &BotRegistry) {
    let entries = match config::load_bots(&cfg.bots_file) {
        Ok(Some(entries)) => entries,
        Ok(None) => {
            warn!(path = %cfg.bots_file.display(), "no bots file found; running with zero bots");
            return;
        }
        Err(e) => {
            error!(path = %cfg.bots_file.display(), error = %e, "failed to load bots");
            return;
        }
    };

    let total = entries.len();
    for entry in entries {
        if let Err(e) = registry.start(entry.token.clone(), &entry.name).await {
            error!(bot = %entry.name, token = %entry.token, error = %e, "failed to start bot");
        }
    }
    info!(
        configured = total,
        running = registry.count().await,
        "loaded bots from {}",
        cfg.bots_file.display()
    );
}
