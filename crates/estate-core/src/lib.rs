//! Core types and the statistical query engine for the listing store.
//!
//! No HTTP or database dependencies. Storage backends implement
//! [`store::ListingStore`]; the HTTP layer calls the operations in [`ops`].

pub mod buckets;
pub mod error;
pub mod ingest;
pub mod memory;
pub mod observation;
pub mod ops;
pub mod page;
pub mod query;
pub mod stats;
pub mod store;
pub mod timeseries;

pub use error::{Error, Result};
