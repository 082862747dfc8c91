//! Bulk CSV loader.
//!
//! Rows are parsed with [`RawListing`], validated, optionally checked against
//! [`SanityBounds`] and committed in fixed-size batches. A bad row never
//! aborts the load, and a failed batch is counted and skipped.

use std::{io, path::Path};

use estate_core::{
  Error as CoreError,
  ingest::{RawListing, SanityBounds},
  observation::NewObservation,
  store::ListingStore,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 5000;

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
  pub batch_size: usize,
  /// When set, rows outside these bounds are skipped.
  pub sanity:     Option<SanityBounds>,
}

impl Default for LoadOptions {
  fn default() -> Self { Self { batch_size: DEFAULT_BATCH_SIZE, sanity: None } }
}

/// What happened to each row of a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
  /// Data rows read, excluding the header.
  pub read:              usize,
  pub inserted:          usize,
  pub skipped_missing:   usize,
  pub skipped_malformed: usize,
  pub skipped_filtered:  usize,
  pub failed_batches:    usize,
}

/// Load every row of `path` into `store`.
pub async fn load_csv<S: ListingStore>(
  store: &S,
  path: &Path,
  opts: &LoadOptions,
) -> Result<LoadReport, LoadError> {
  let file = std::fs::File::open(path)?;
  info!(path = %path.display(), "loading listings");
  load_reader(store, file, opts).await
}

/// Load CSV data with a header row from `reader` into `store`.
pub async fn load_reader<S, R>(
  store: &S,
  reader: R,
  opts: &LoadOptions,
) -> Result<LoadReport, LoadError>
where
  S: ListingStore,
  R: io::Read,
{
  let mut rdr = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .flexible(true)
    .from_reader(reader);
  // Fail early on an unreadable header rather than reporting every row as
  // malformed.
  rdr.headers()?;

  let batch_size = opts.batch_size.max(1);
  let mut report = LoadReport::default();
  let mut batch: Vec<NewObservation> = Vec::with_capacity(batch_size);

  for (line, record) in rdr.deserialize::<RawListing>().enumerate() {
    report.read += 1;
    let raw = match record {
      Ok(raw) => raw,
      Err(e) => {
        warn!(row = line + 1, error = %e, "skipping malformed row");
        report.skipped_malformed += 1;
        continue;
      }
    };

    let new = match raw.into_new_observation() {
      Ok(new) => new,
      Err(CoreError::MissingRequiredField(field)) => {
        warn!(row = line + 1, field, "skipping row with missing field");
        report.skipped_missing += 1;
        continue;
      }
      Err(e) => {
        warn!(row = line + 1, error = %e, "skipping malformed row");
        report.skipped_malformed += 1;
        continue;
      }
    };

    if let Some(bounds) = &opts.sanity
      && !bounds.accepts(&new)
    {
      debug!(row = line + 1, property_id = new.property_id, "filtered row");
      report.skipped_filtered += 1;
      continue;
    }

    batch.push(new);
    if batch.len() >= batch_size {
      flush(store, &mut batch, &mut report).await;
    }
  }
  if !batch.is_empty() {
    flush(store, &mut batch, &mut report).await;
  }

  info!(
    read = report.read,
    inserted = report.inserted,
    skipped = report.skipped_missing
      + report.skipped_malformed
      + report.skipped_filtered,
    failed_batches = report.failed_batches,
    "load finished"
  );
  Ok(report)
}

async fn flush<S: ListingStore>(
  store: &S,
  batch: &mut Vec<NewObservation>,
  report: &mut LoadReport,
) {
  let rows = std::mem::take(batch);
  let size = rows.len();
  match store.insert_batch(rows).await {
    Ok(n) => report.inserted += n,
    Err(e) => {
      warn!(size, error = %e, "batch insert failed");
      report.failed_batches += 1;
    }
  }
}
