//! Token -> session table.
//!
//! The registry is the only writer of process-wide bot state. Pollers live in a
//! table whose lock is held for a whole start or shutdown, so a replacement always
//! finishes stopping the old poller before the new one is launched and two `start`
//! calls for the same token can never interleave. Names live in a separate directory
//! that is only locked for in-memory reads and writes, so `count` and `names` never
//! wait on a stop or a launch.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::{
    domain::BotToken,
    errors::Error,
    ports::{PollingHandle, SessionLauncher},
    Result,
};

pub struct BotRegistry {
    launcher: Arc<dyn SessionLauncher>,
    pollers: Mutex<HashMap<BotToken, Box<dyn PollingHandle>>>,
    directory: RwLock<HashMap<BotToken, String>>,
}

impl BotRegistry {
    pub fn new(launcher: Arc<dyn SessionLauncher>) -> Self {
        Self {
            launcher,
            pollers: Mutex::new(HashMap::new()),
            directory: RwLock::new(HashMap::new()),
        }
    }

    /// Start (or restart) the session for `token`.
    ///
    /// A failure to stop the previous session is logged and ignored; only a failure
    /// to launch the new one is returned. The old name stays listed until the
    /// replacement is known, so the count does not dip during a restart.
    pub async fn start(&self, token: BotToken, name: &str) -> Result<()> {
        let mut pollers = self.pollers.lock().await;

        if let Some(mut old) = pollers.remove(&token) {
            info!(bot = %name, token = %token, "replacing running session");
            if let Err(e) = old.stop().await {
                let e = Error::SessionReplace(e.to_string());
                warn!(bot = %name, token = %token, error = %e, "ignoring stop failure");
            }
        }

        let handle = match self.launcher.launch(&token, name).await {
            Ok(handle) => handle,
            Err(e) => {
                self.directory.write().await.remove(&token);
                return Err(e);
            }
        };
        info!(bot = %name, token = %token, "started bot");
        pollers.insert(token.clone(), handle);
        self.directory.write().await.insert(token, name.to_string());
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.directory.read().await.len()
    }

    /// Display names of the registered sessions, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.directory.read().await.values().cloned().collect();
        names.sort();
        names
    }

    /// Stop every session and empty the table.
    pub async fn shutdown_all(&self) {
        let mut pollers = self.pollers.lock().await;
        for (token, mut handle) in pollers.drain() {
            let name = self.directory.write().await.remove(&token);
            if let Err(e) = handle.stop().await {
                warn!(bot = ?name, token = %token, error = %e, "failed to stop session");
            }
        }
    }
}
