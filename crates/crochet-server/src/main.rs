//! crochet server binary.
//!
//! Receives Alertmanager webhook notifications, aggregates them into
//! incidents, and serves both over a JSON API alongside Prometheus metrics.
//! When `assets_dir` is configured, the web UI is served from it as well.
//!
//! # Usage
//!
//! ```
//! crochet --listen-address 0.0.0.0:8080
//! crochet --config /etc/crochet/crochet.toml
//! ```

mod settings;
mod shutdown;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use crochet_api::AppState;
use crochet_store_actor::ActorStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Simple API service to receive and serve Alertmanager webhook payloads"
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "crochet.toml")]
  config: PathBuf,

  /// Listen address, overriding the configuration file.
  #[arg(long, value_name = "ADDR")]
  listen_address: Option<String>,
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

  let server_cfg = settings::load(&cli.config, cli.listen_address)
    .context("failed to load configuration")?;

  // The store outlives the HTTP server: it is stopped only once the server
  // has drained, so no request can be left waiting on it.
  let store_stop = CancellationToken::new();
  let (store, store_task) = ActorStore::spawn(store_stop.clone());

  if let Some(dir) = &server_cfg.assets_dir {
    tracing::info!(assets_dir = %dir.display(), "serving static assets");
  }
  let app =
    crochet_api::router(AppState::new(store), server_cfg.assets_dir.clone())
      .layer(TraceLayer::new_for_http());

  let address = server_cfg.listen_address;
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let shutdown = shutdown::create_shutdown_token();
  axum::serve(
    listener,
    app.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .with_graceful_shutdown(shutdown.cancelled_owned())
  .await
  .context("server error")?;

  tracing::info!("HTTP server stopped, draining store");
  store_stop.cancel();
  store_task.await.context("store actor panicked")?;

  Ok(())
}
