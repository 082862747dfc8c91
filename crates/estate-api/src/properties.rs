//! Handlers for `/property` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/property/` | Paged listing |
//! | `GET`  | `/property/statistics` | 404 when nothing matches |
//! | `GET`  | `/property/outliers/price` | Paged |
//! | `GET`  | `/property/outliers/price-per-sqft` | Paged |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
};
use estate_core::{
  observation::Property,
  ops::{self, PropertyStatistics},
  page::Page,
  store::ListingStore,
};

use crate::{error::ApiError, params::ListingParams};

/// `GET /property/`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Page<Property>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  let page = params.page()?;
  Ok(Json(ops::list_properties(store.as_ref(), &query, page).await?))
}

/// `GET /property/statistics`
pub async fn statistics<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<PropertyStatistics>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  Ok(Json(ops::statistics(store.as_ref(), &query).await?))
}

// ─── Outliers ─────────────────────────────────────────────────────────────────

/// `GET /property/outliers/price`
pub async fn price_outliers<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Page<Property>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  let page = params.page()?;
  Ok(Json(ops::price_outliers(store.as_ref(), &query, page).await?))
}

/// `GET /property/outliers/price-per-sqft`
pub async fn price_per_sqft_outliers<S>(
  State(store): State<Arc<S>>,
  params: ListingParams,
) -> Result<Json<Page<Property>>, ApiError>
where
  S: ListingStore,
{
  let query = params.query()?;
  let page = params.page()?;
  Ok(Json(
    ops::price_per_sqft_outliers(store.as_ref(), &query, page).await?,
  ))
}
