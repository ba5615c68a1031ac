use std::{convert::Infallible, sync::Arc, time::Duration};

use async_trait::async_trait;
use teloxide::{
    dispatching::{Dispatcher, ShutdownToken},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use subbot_core::{
    domain::BotToken,
    errors::Error,
    messaging::port::MessagingPort,
    ports::{PollingHandle, SessionLauncher},
    session::{BotSession, SessionDeps},
    Result,
};

use crate::handlers::{self, BotIdentity};
use crate::TelegramMessenger;

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Starts one teloxide dispatcher per token, all sharing the same media collaborators.
#[derive(Clone)]
pub struct TelegramLauncher {
    deps: SessionDeps,
}

impl TelegramLauncher {
    pub fn new(deps: SessionDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl SessionLauncher for TelegramLauncher {
    async fn launch(&self, token: &BotToken, name: &str) -> Result<Box<dyn PollingHandle>> {
        let bot = Bot::new(token.expose());

        // Polling starts even when getMe fails; commands are then not filtered by @username.
        let identity = match bot.get_me().await {
            Ok(me) => {
                info!(bot = %name, username = ?me.user.username, "telegram identity confirmed");
                BotIdentity {
                    username: me.user.username.clone(),
                }
            }
            Err(e) => {
                warn!(bot = %name, token = %token, error = %e, "getMe failed");
                BotIdentity::default()
            }
        };

        let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
        let session = Arc::new(BotSession::new(name, messenger, self.deps.clone()));

        let handler = dptree::entry()
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
            .branch(Update::filter_message().endpoint(handlers::handle_message));

        // No distribution key: every update runs concurrently, including several from one chat.
        let mut dispatcher = Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![session, identity])
            .distribution_function(|_| None::<Infallible>)
            .default_handler(|_| async {})
            .error_handler(LoggingErrorHandler::with_custom_text(format!(
                "[{name}] error in update handler"
            )))
            .build();

        let shutdown = dispatcher.shutdown_token();
        let bot_name = name.to_string();
        let task = tokio::spawn(async move {
            dispatcher.dispatch().await;
            info!(bot = %bot_name, "polling stopped");
        });

        Ok(Box::new(TelegramPolling {
            shutdown,
            task: Some(task),
        }))
    }
}

/// Handle to a running dispatcher task.
pub struct TelegramPolling {
    shutdown: ShutdownToken,
    task: Option<JoinHandle<()>>,
}

#[async_trait]
impl PollingHandle for TelegramPolling {
    async fn stop(&mut self) -> Result<()> {
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        let graceful = match self.shutdown.shutdown() {
            Ok(done) => tokio::time::timeout(STOP_TIMEOUT, done)
                .await
                .map_err(|_| Error::External("dispatcher did not stop in time".to_string())),
            Err(idle) => Err(Error::External(idle.to_string())),
        };

        // An idle or stuck dispatcher is torn down anyway: no poller may outlive stop().
        if graceful.is_err() {
            task.abort();
        }
        let _ = (&mut task).await;

        graceful
    }
}

impl Drop for TelegramPolling {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
