use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use media_grab::downloader::{InstaloaderBackend, YtDlpBackend};
use media_grab::{retention, router, AppState, Cli, Retriever, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("media_grab=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_cli(Cli::parse());
    let downloads_dir = config.retrieval.downloads_dir.clone();

    tokio::fs::create_dir_all(&downloads_dir)
        .await
        .with_context(|| format!("cannot create downloads dir {}", downloads_dir.display()))?;

    let posts = InstaloaderBackend::new(config.instaloader_path.clone(), config.backend_timeout);
    let generic = YtDlpBackend::new(config.ytdlp_path.clone(), config.backend_timeout);
    info!(
        instaloader = %posts.binary_path().display(),
        ytdlp = %generic.binary_path().display(),
        fallback = ?config.retrieval.fallback,
        "backends configured"
    );
    if config.host != "127.0.0.1" && config.host != "localhost" {
        warn!(host = %config.host, "no authentication or rate limiting; do not expose untrusted");
    }

    let retriever = Retriever::new(
        Arc::new(config.retrieval.clone()),
        Arc::new(posts),
        Arc::new(generic),
    );
    let state = Arc::new(AppState::new(retriever));

    let _sweeper = retention::spawn_sweeper(downloads_dir.clone(), config.retention);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    info!(downloads = %downloads_dir.display(), "media server listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
