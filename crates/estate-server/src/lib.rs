//! Server assembly for the listing store: configuration, the HTTP app and
//! the bulk CSV loader.

pub mod load;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use estate_core::store::ListingStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ESTATE_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// CSV file loaded at startup, if any.
  pub data_file:       Option<PathBuf>,
  /// Clear the store before loading.
  pub reset_on_start:  bool,
  /// Drop implausible prices while loading.
  pub filter_outliers: bool,
  /// Rows per insert transaction.
  pub batch_size:      usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "0.0.0.0".to_string(),
      port:            8000,
      store_path:      PathBuf::from("real_estate.db"),
      data_file:       None,
      reset_on_start:  true,
      filter_outliers: false,
      batch_size:      load::DEFAULT_BATCH_SIZE,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn load_options(&self) -> load::LoadOptions {
    load::LoadOptions {
      batch_size: self.batch_size,
      sanity:     self.filter_outliers.then(Default::default),
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: ListingStore + 'static,
{
  estate_api::api_router(store).layer(TraceLayer::new_for_http())
}
