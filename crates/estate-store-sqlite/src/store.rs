//! [`SqliteStore`], the SQLite implementation of [`ListingStore`].

use std::path::Path;

use estate_core::{
  observation::{NewObservation, Observation},
  page::PageRequest,
  query::PropertyQuery,
  store::ListingStore,
};
use tracing::debug;

use crate::{
  Result,
  encode::{RawObservation, encode_timestamp},
  schema::SCHEMA,
  sql::{self, Statement},
};

const INSERT: &str = "
INSERT INTO observations (
    property_id, address, city, state, zipcode, price, bedrooms, bathrooms,
    squarefeet, price_per_square_feet, observed_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A listing store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ListingStore impl ───────────────────────────────────────────────────────

impl ListingStore for SqliteStore {
  type Error = crate::Error;

  async fn reset(&self) -> Result<()> {
    let removed = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM observations", [])?))
      .await?;
    debug!(removed, "reset observations table");
    Ok(())
  }

  async fn insert_batch(&self, batch: Vec<NewObservation>) -> Result<usize> {
    let rows: Vec<NewObservation> =
      batch.into_iter().map(NewObservation::normalize).collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(INSERT)?;
          for r in &rows {
            stmt.execute(rusqlite::params![
              r.property_id,
              r.address,
              r.city,
              r.state,
              r.zipcode,
              r.price,
              r.bedrooms,
              r.bathrooms,
              r.squarefeet,
              r.price_per_square_feet(),
              encode_timestamp(r.observed_at),
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    debug!(inserted, "committed observation batch");
    Ok(inserted)
  }

  async fn count(&self, query: &PropertyQuery) -> Result<u64> {
    let Statement { sql, params } = sql::count(query);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &sql,
          rusqlite::params_from_iter(params),
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn fetch(
    &self,
    query: &PropertyQuery,
    page: Option<PageRequest>,
  ) -> Result<Vec<Observation>> {
    let Statement { sql, params } = sql::select(query, page);
    let raws: Vec<RawObservation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawObservation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(rows = raws.len(), view = ?query.view, "fetched observations");
    raws.into_iter().map(RawObservation::into_observation).collect()
  }
}
