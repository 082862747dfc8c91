//! The `ListingStore` trait.
//!
//! Implemented by storage backends (e.g. `estate-store-sqlite`) and by the
//! in-memory [`MemoryStore`](crate::memory::MemoryStore). The query
//! operations in [`crate::ops`] and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  observation::{NewObservation, Observation},
  page::PageRequest,
  query::PropertyQuery,
};

/// Abstraction over a listing store backend.
///
/// Observations are append-only. Every read takes a [`PropertyQuery`] and
/// must follow its semantics exactly: the latest view is resolved over the
/// whole table before predicates apply, and results are ordered by
/// `(property_id, id)`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ListingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Remove every observation.
  fn reset(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append a batch atomically and return the number of rows inserted.
  /// Rows are normalised and `price_per_square_feet` is derived by the store.
  fn insert_batch(
    &self,
    batch: Vec<NewObservation>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Number of observations matching `query`.
  fn count<'a>(
    &'a self,
    query: &'a PropertyQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Observations matching `query`, optionally restricted to one page.
  fn fetch<'a>(
    &'a self,
    query: &'a PropertyQuery,
    page: Option<PageRequest>,
  ) -> impl Future<Output = Result<Vec<Observation>, Self::Error>> + Send + 'a;
}
