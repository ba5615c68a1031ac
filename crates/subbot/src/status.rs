//! Read-only status page: how many bots are registered.

use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, response::Html, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use subbot_core::registry::BotRegistry;

pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("status server listening on http://{addr}");
    Ok(listener)
}

pub fn router(registry: Arc<BotRegistry>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .with_state(registry)
}

pub async fn serve(
    listener: TcpListener,
    registry: Arc<BotRegistry>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

async fn index_handler(State(registry): State<Arc<BotRegistry>>) -> Html<String> {
    Html(render(registry.count().await))
}

fn render(count: usize) -> String {
    format!(
        r#"<html>
<head><title>SubBot</title></head>
<body style="background:#000;color:#0ff;text-align:center;font-family:monospace;">
<h2>🤖 SubBot is Running!</h2>
<p>Loaded Bots: {count}</p>
</body></html>
"#
    )
}
