use std::{path::PathBuf, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use subbot_core::media::scratch::sweep_stale;

const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Periodically delete stale scratch files until `cancel` fires. The first sweep runs immediately.
pub async fn run(dir: PathBuf, max_age: Duration, cancel: CancellationToken) {
    let mut tick = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => match sweep_stale(&dir, max_age).await {
                Ok(0) => debug!(dir = %dir.display(), "scratch sweep: nothing to remove"),
                Ok(n) => info!(dir = %dir.display(), removed = n, "scratch sweep"),
                Err(e) => warn!(dir = %dir.display(), error = %e, "scratch sweep failed"),
            },
        }
    }
}
