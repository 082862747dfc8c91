//! In-memory [`ListingStore`].
//!
//! Evaluates every query with [`PropertyQuery::evaluate`], so it doubles as
//! the reference implementation that durable backends are tested against.

use std::{
  convert::Infallible,
  future::{Future, ready},
  sync::{PoisonError, RwLock},
};

use crate::{
  observation::{NewObservation, Observation},
  page::PageRequest,
  query::PropertyQuery,
  store::ListingStore,
};

#[derive(Debug, Default)]
struct Table {
  rows:    Vec<Observation>,
  last_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  table: RwLock<Table>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn read<T>(&self, f: impl FnOnce(&Table) -> T) -> T {
    f(&self.table.read().unwrap_or_else(PoisonError::into_inner))
  }

  fn write<T>(&self, f: impl FnOnce(&mut Table) -> T) -> T {
    f(&mut self.table.write().unwrap_or_else(PoisonError::into_inner))
  }
}

impl ListingStore for MemoryStore {
  type Error = Infallible;

  fn reset(&self) -> impl Future<Output = Result<(), Infallible>> + Send + '_ {
    // Row ids keep increasing across resets, as with AUTOINCREMENT.
    self.write(|t| t.rows.clear());
    ready(Ok(()))
  }

  fn insert_batch(
    &self,
    batch: Vec<NewObservation>,
  ) -> impl Future<Output = Result<usize, Infallible>> + Send + '_ {
    let inserted = self.write(|t| {
      let n = batch.len();
      for new in batch {
        t.last_id += 1;
        let row = new.into_observation(t.last_id);
        t.rows.push(row);
      }
      n
    });
    ready(Ok(inserted))
  }

  fn count<'a>(
    &'a self,
    query: &'a PropertyQuery,
  ) -> impl Future<Output = Result<u64, Infallible>> + Send + 'a {
    let n = self.read(|t| query.evaluate(&t.rows).len() as u64);
    ready(Ok(n))
  }

  fn fetch<'a>(
    &'a self,
    query: &'a PropertyQuery,
    page: Option<PageRequest>,
  ) -> impl Future<Output = Result<Vec<Observation>, Infallible>> + Send + 'a {
    let rows = self.read(|t| query.evaluate(&t.rows));
    let rows = match page {
      Some(page) => page.slice(rows).results,
      None => rows,
    };
    ready(Ok(rows))
  }
}
