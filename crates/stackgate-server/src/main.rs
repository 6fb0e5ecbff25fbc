//! stackgate server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the scan API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use stackgate_core::scan::ScanEngine;
use stackgate_server::{
  AppState, ServerConfig,
  notify::{ScanNotifier, WebhookNotifier},
};
use stackgate_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Stackgate library-access server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("STACKGATE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let db_path = expand_tilde(&server_cfg.db_path);

  // Open SQLite store.
  let store = SqliteStore::open(&db_path, server_cfg.boundary)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  // Select the notification backend.
  let notifier = match &server_cfg.notify_url {
    Some(url) => {
      tracing::info!(%url, "skip alerts delivered via webhook");
      ScanNotifier::Webhook(WebhookNotifier::new(
        url.clone(),
        Duration::from_secs(server_cfg.notify_timeout_secs),
      )?)
    }
    None => {
      tracing::info!("no notify_url configured; skip alerts logged only");
      ScanNotifier::Log
    }
  };

  let state = AppState {
    engine: Arc::new(ScanEngine::new(Arc::new(store), Arc::new(notifier))),
  };

  let app = stackgate_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
