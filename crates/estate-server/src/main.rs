//! estate-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) and
//! `ESTATE_*` environment variables, opens the SQLite store, optionally
//! resets it and bulk-loads a CSV file, then serves the JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use estate_core::store::ListingStore;
use estate_server::{ServerConfig, load};
use estate_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Real-estate listing store server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// CSV file to load at startup. Overrides `data_file`.
  #[arg(long)]
  load: Option<PathBuf>,

  /// Keep existing rows instead of clearing the store at startup.
  #[arg(long)]
  no_reset: bool,
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
    .add_source(config::Environment::with_prefix("ESTATE"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  if cli.load.is_some() {
    server_cfg.data_file = cli.load;
  }
  if cli.no_reset {
    server_cfg.reset_on_start = false;
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if server_cfg.reset_on_start {
    store.reset().await.context("failed to reset store")?;
    tracing::info!("store reset");
  }

  if let Some(path) = &server_cfg.data_file {
    let report = load::load_csv(&store, path, &server_cfg.load_options())
      .await
      .with_context(|| format!("failed to load {path:?}"))?;
    tracing::info!(?report, "initial load complete");
  }

  let app = estate_server::app(Arc::new(store));
  let address = server_cfg.address();

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
