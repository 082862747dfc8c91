//! Query operations over any [`ListingStore`].
//!
//! Each operation fetches the rows its query selects, then hands them to the
//! statistics engine, the bucketing helper or the time-series normalizer.
//! Operations that compare prices with areas restrict the query to rows where
//! both are known and positive, so price- and area-driven results are always
//! computed over the same row set.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::{
  Error,
  buckets::{
    Accumulator, BEDROOM_BANDS, BandLabels, BucketCount, ListingAggregate,
    PRICE_HISTOGRAM_BANDS,
  },
  observation::{Observation, Property},
  page::{Page, PageRequest},
  query::{Field, Predicate, PropertyQuery, View},
  stats::{Distribution, Percentiles, SpreadSummary, select_outliers},
  store::ListingStore,
  timeseries::{
    Month, MonthlyTrend, Reading, forward_fill, monthly_trend, zipcode_monthly,
  },
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum QueryError<E: std::error::Error + 'static> {
  #[error(transparent)]
  Core(#[from] Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

pub type QueryResult<T, E> = Result<T, QueryError<E>>;

async fn fetch_all<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<Vec<Observation>, S::Error> {
  store.fetch(query, None).await.map_err(QueryError::Store)
}

/// Restrict `query` to rows with a positive price and a positive area.
fn priced(query: &PropertyQuery) -> PropertyQuery {
  query
    .clone()
    .and(Predicate::Positive(Field::Price))
    .and(Predicate::Positive(Field::SquareFeet))
}

/// Dated, priced history rows, regardless of the caller's view.
fn dated_history(query: &PropertyQuery) -> PropertyQuery {
  query
    .clone()
    .with_view(View::History)
    .and(Predicate::Positive(Field::Price))
    .and(Predicate::Dated)
}

// ─── Listing ─────────────────────────────────────────────────────────────────

pub async fn list_properties<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
  page: PageRequest,
) -> QueryResult<Page<Property>, S::Error> {
  let total = store.count(query).await.map_err(QueryError::Store)?;
  let rows = store
    .fetch(query, Some(page))
    .await
    .map_err(QueryError::Store)?;
  Ok(page.wrap(total, rows).map(Property::from))
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePercentiles {
  pub percentile_25_price: f64,
  pub percentile_50_price: f64,
  pub percentile_75_price: f64,
  pub percentile_90_price: f64,
  pub percentile_99_price: f64,
}

impl From<Percentiles> for PricePercentiles {
  fn from(p: Percentiles) -> Self {
    Self {
      percentile_25_price: p.p25,
      percentile_50_price: p.p50,
      percentile_75_price: p.p75,
      percentile_90_price: p.p90,
      percentile_99_price: p.p99,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyStatistics {
  pub average_price:            f64,
  pub median_price:             f64,
  pub average_price_per_sqft:   f64,
  pub total_properties:         usize,
  pub percentiles:              PricePercentiles,
  /// Rows whose price falls outside the IQR fences.
  pub outlier_properties_count: usize,
}

/// Price statistics over the rows `query` selects that have both a price and
/// an area. Fails with [`Error::EmptyResultSet`] when there are none.
pub async fn statistics<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<PropertyStatistics, S::Error> {
  let rows = fetch_all(store, &priced(query)).await?;

  let prices = Distribution::new(rows.iter().filter_map(|o| o.price))?;
  let ppsf =
    Distribution::new(rows.iter().filter_map(|o| o.price_per_square_feet))?;
  let bounds = prices.outlier_bounds();

  Ok(PropertyStatistics {
    average_price:            prices.mean(),
    median_price:             prices.median(),
    average_price_per_sqft:   ppsf.mean(),
    total_properties:         prices.len(),
    percentiles:              prices.percentiles().into(),
    outlier_properties_count: rows
      .iter()
      .filter_map(|o| o.price)
      .filter(|p| bounds.is_outlier(*p))
      .count(),
  })
}

// ─── Outliers ────────────────────────────────────────────────────────────────

async fn outliers_by<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
  page: PageRequest,
  field: Field,
) -> QueryResult<Page<Property>, S::Error> {
  let rows = fetch_all(store, &priced(query)).await?;
  let outliers = select_outliers(rows, |o| field.value(o))?;
  Ok(page.slice(outliers).map(Property::from))
}

/// Listings whose price lies outside the IQR fences of their peers.
pub async fn price_outliers<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
  page: PageRequest,
) -> QueryResult<Page<Property>, S::Error> {
  outliers_by(store, query, page, Field::Price).await
}

/// Listings whose price per square foot lies outside the IQR fences of their
/// peers.
pub async fn price_per_sqft_outliers<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
  page: PageRequest,
) -> QueryResult<Page<Property>, S::Error> {
  outliers_by(store, query, page, Field::PricePerSquareFeet).await
}

// ─── Distributions ───────────────────────────────────────────────────────────

/// Listing counts per price band. Every band is reported.
pub async fn price_distribution<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<Vec<BucketCount>, S::Error> {
  let q = query.clone().and(Predicate::Positive(Field::Price));
  let rows = fetch_all(store, &q).await?;
  Ok(PRICE_HISTOGRAM_BANDS.histogram(rows.iter().filter_map(|o| o.price)))
}

/// Listing counts per bedroom count, with six and more grouped as `5+`.
pub async fn bedroom_distribution<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<Vec<BucketCount>, S::Error> {
  let q = query.clone().and(Predicate::Present(Field::Bedrooms));
  let rows = fetch_all(store, &q).await?;
  Ok(
    BEDROOM_BANDS
      .histogram(rows.iter().filter_map(|o| o.bedrooms.map(f64::from))),
  )
}

// ─── Trends ──────────────────────────────────────────────────────────────────

/// Average price per month over forward-filled property histories.
///
/// Always runs over the history view; the caller's view is ignored.
pub async fn price_trend<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<Vec<MonthlyTrend>, S::Error> {
  let rows = fetch_all(store, &dated_history(query)).await?;
  let filled = forward_fill(rows.iter().filter_map(Reading::point));
  let trend = monthly_trend(&filled);
  if trend.is_empty() {
    return Err(Error::EmptyResultSet.into());
  }
  Ok(trend)
}

// ─── Zipcodes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipcodeSummary {
  pub zipcode:   String,
  #[serde(flatten)]
  pub aggregate: ListingAggregate,
  #[serde(flatten)]
  pub bands:     BandLabels,
}

/// Per-zipcode averages with their band labels, ordered by zipcode. Only rows
/// with a known area take part; unpriced rows count as listings but not
/// towards the price averages. Rows without a zipcode are skipped.
pub async fn zipcode_summary<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<Vec<ZipcodeSummary>, S::Error> {
  let q = query.clone().and(Predicate::Positive(Field::SquareFeet));
  let rows = fetch_all(store, &q).await?;

  let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
  for o in rows.iter().filter(|o| !o.zipcode.is_empty()) {
    groups.entry(o.zipcode.as_str()).or_default().add(
      o.price,
      o.price_per_square_feet,
      o.squarefeet,
    );
  }

  let summaries: Vec<ZipcodeSummary> = groups
    .into_iter()
    .filter_map(|(zipcode, acc)| {
      let aggregate = acc.finish()?;
      Some(ZipcodeSummary {
        zipcode: zipcode.to_owned(),
        bands: aggregate.bands(),
        aggregate,
      })
    })
    .collect();
  if summaries.is_empty() {
    return Err(Error::EmptyResultSet.into());
  }
  Ok(summaries)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipcodeMonth {
  pub month:     Month,
  pub zipcode:   String,
  #[serde(flatten)]
  pub aggregate: ListingAggregate,
  #[serde(flatten)]
  pub bands:     BandLabels,
}

/// Per-zipcode monthly averages over forward-filled histories, ordered by
/// month then zipcode. Always runs over the history view.
pub async fn zipcode_trend<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<Vec<ZipcodeMonth>, S::Error> {
  let q = dated_history(query).and(Predicate::Positive(Field::SquareFeet));
  let rows = fetch_all(store, &q).await?;
  let filled = forward_fill(rows.iter().filter_map(Reading::point));

  let cells: Vec<ZipcodeMonth> = zipcode_monthly(&filled)
    .into_iter()
    .map(|(month, zipcode, aggregate)| ZipcodeMonth {
      month,
      zipcode,
      bands: aggregate.bands(),
      aggregate,
    })
    .collect();
  if cells.is_empty() {
    return Err(Error::EmptyResultSet.into());
  }
  Ok(cells)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipcodeSpread {
  pub zipcode:               String,
  pub price:                 SpreadSummary,
  pub price_per_square_feet: SpreadSummary,
}

/// Box-plot data for price and price per square foot, per zipcode.
pub async fn zipcode_price_spread<S: ListingStore>(
  store: &S,
  query: &PropertyQuery,
) -> QueryResult<Vec<ZipcodeSpread>, S::Error> {
  let rows = fetch_all(store, &priced(query)).await?;

  let mut groups: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
  for o in rows.iter().filter(|o| !o.zipcode.is_empty()) {
    groups.entry(o.zipcode.as_str()).or_default().push(o);
  }
  if groups.is_empty() {
    return Err(Error::EmptyResultSet.into());
  }

  let mut spreads = Vec::with_capacity(groups.len());
  for (zipcode, members) in groups {
    let price = Distribution::new(members.iter().filter_map(|o| o.price))?;
    let ppsf = Distribution::new(
      members.iter().filter_map(|o| o.price_per_square_feet),
    )?;
    spreads.push(ZipcodeSpread {
      zipcode:               zipcode.to_owned(),
      price:                 price.spread(),
      price_per_square_feet: ppsf.spread(),
    });
  }
  Ok(spreads)
}
