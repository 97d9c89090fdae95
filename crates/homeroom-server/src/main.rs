//! `homeroom-server` — serves the Homeroom JSON API over a SQLite store.
//!
//! # Usage
//!
//! ```text
//! homeroom-server --config config.toml
//! HOMEROOM_PORT=9000 homeroom-server
//! ```

mod reminders;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use homeroom_api::{ApiState, api_router};
use homeroom_core::{projector::Projector, tracker::Tracker};
use homeroom_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Homeroom homework tracker server")]
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
  let server_cfg = ServerConfig::load(&cli.config)?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  // Start projecting live views.
  let mut projector = Projector::new(store.clone(), server_cfg.loading_gate);
  projector.start().await.context("failed to start projector")?;

  let reminder = reminders::spawn(server_cfg.reminder, projector.watch());

  let state = ApiState { tracker: Tracker::new(store), views: projector.watch() };
  let app = Router::new().nest("/api", api_router(state));

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let served = axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error");

  reminder.abort();
  projector.stop().await;
  tracing::info!("shut down");
  served
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!("failed to listen for ctrl-c: {e}");
    std::future::pending::<()>().await;
  }
}
