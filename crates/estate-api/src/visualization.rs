//! Handlers for `/visualization/property` endpoints.
//!
//! These return the tabular data behind each chart; rendering is left to
//! the client.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
};
use estate_core::{
  buckets::BucketCount,
  ops::{self, ZipcodeMonth, ZipcodeSpread, ZipcodeSummary},
  store::ListingStore,
  timeseries::MonthlyTrend,
};

use crate::{error::ApiError, params::ListingParams};

/// `GET /visualization/property/price`
pub async fn price<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Vec<BucketCount>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  Ok(Json(ops::price_distribution(store.as_ref(), &query).await?))
}

/// `GET /visualization/property/rooms`
pub async fn rooms<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Vec<BucketCount>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  Ok(Json(ops::bedroom_distribution(store.as_ref(), &query).await?))
}

/// `GET /visualization/property/historical-price`
pub async fn historical_price<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Vec<MonthlyTrend>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  Ok(Json(ops::price_trend(store.as_ref(), &query).await?))
}

/// `GET /visualization/property/zipcodes`
pub async fn zipcodes<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Vec<ZipcodeSummary>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  Ok(Json(ops::zipcode_summary(store.as_ref(), &query).await?))
}

/// `GET /visualization/property/historical-zipcodes`
pub async fn historical_zipcodes<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Vec<ZipcodeMonth>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  Ok(Json(ops::zipcode_trend(store.as_ref(), &query).await?))
}

/// `GET /visualization/property/price-vs-zipcode`
pub async fn price_vs_zipcode<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Vec<ZipcodeSpread>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  Ok(Json(ops::zipcode_price_spread(store.as_ref(), &query).await?))
}
