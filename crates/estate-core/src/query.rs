//! Filter predicate builder.
//!
//! User-facing [`PropertyFilters`] are validated and lowered into a flat list
//! of [`Predicate`]s plus a [`View`] selector. Storage backends compile the
//! predicates to their own query language; [`PropertyQuery::evaluate`] is the
//! in-memory reference semantics every backend must agree with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, observation::Observation};

// ─── Filters ─────────────────────────────────────────────────────────────────

/// An inclusive numeric range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
  pub min: Option<f64>,
  pub max: Option<f64>,
}

impl Range {
  pub fn between(min: f64, max: f64) -> Self {
    Self { min: Some(min), max: Some(max) }
  }

  pub fn at_least(min: f64) -> Self { Self { min: Some(min), max: None } }

  pub fn at_most(max: f64) -> Self { Self { min: None, max: Some(max) } }

  fn validate(&self, field: Field) -> Result<()> {
    match (self.min, self.max) {
      (Some(min), Some(max)) if min > max => Err(Error::InvalidRange {
        field: field.name(),
        min,
        max,
      }),
      _ => Ok(()),
    }
  }

  fn lower(&self, field: Field, out: &mut Vec<Predicate>) {
    if let Some(min) = self.min {
      out.push(Predicate::AtLeast(field, min));
    }
    if let Some(max) = self.max {
      out.push(Predicate::AtMost(field, max));
    }
  }
}

/// Structured filters accepted from callers. Every field is optional; set
/// fields are combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilters {
  pub price:                 Range,
  pub price_per_square_feet: Range,
  pub squarefeet:            Range,
  pub bedrooms:              Option<u32>,
  pub bathrooms:             Option<f64>,
  pub zipcode:               Option<String>,
  pub city:                  Option<String>,
  pub state:                 Option<String>,
}

/// Which observations of a property participate in a query.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
  /// Exactly one observation per property: the most recent one.
  #[default]
  Latest,
  /// Every observation, no recency filtering.
  History,
}

impl View {
  pub fn from_latest_flag(latest: bool) -> Self {
    if latest { View::Latest } else { View::History }
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// Numeric observation columns that predicates can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Price,
  PricePerSquareFeet,
  SquareFeet,
  Bedrooms,
  Bathrooms,
}

impl Field {
  /// Column name in the record store; also used in error messages.
  pub fn name(self) -> &'static str {
    match self {
      Field::Price => "price",
      Field::PricePerSquareFeet => "price_per_square_feet",
      Field::SquareFeet => "squarefeet",
      Field::Bedrooms => "bedrooms",
      Field::Bathrooms => "bathrooms",
    }
  }

  pub fn value(self, obs: &Observation) -> Option<f64> {
    match self {
      Field::Price => obs.price,
      Field::PricePerSquareFeet => obs.price_per_square_feet,
      Field::SquareFeet => obs.squarefeet,
      Field::Bedrooms => obs.bedrooms.map(f64::from),
      Field::Bathrooms => obs.bathrooms,
    }
  }
}

/// Text observation columns that predicates can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
  Zipcode,
  City,
  State,
}

impl TextField {
  pub fn name(self) -> &'static str {
    match self {
      TextField::Zipcode => "zipcode",
      TextField::City => "city",
      TextField::State => "state",
    }
  }

  pub fn value(self, obs: &Observation) -> &str {
    match self {
      TextField::Zipcode => &obs.zipcode,
      TextField::City => &obs.city,
      TextField::State => &obs.state,
    }
  }
}

// ─── Predicates ──────────────────────────────────────────────────────────────

/// A single row-level condition. A missing value never satisfies a
/// comparison, matching SQL `NULL` semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
  AtLeast(Field, f64),
  AtMost(Field, f64),
  Equals(Field, f64),
  /// Present and strictly greater than zero.
  Positive(Field),
  Present(Field),
  TextEquals(TextField, String),
  /// `observed_at` is present.
  Dated,
}

impl Predicate {
  pub fn matches(&self, obs: &Observation) -> bool {
    match self {
      Predicate::AtLeast(f, v) => f.value(obs).is_some_and(|x| x >= *v),
      Predicate::AtMost(f, v) => f.value(obs).is_some_and(|x| x <= *v),
      Predicate::Equals(f, v) => f.value(obs).is_some_and(|x| x == *v),
      Predicate::Positive(f) => f.value(obs).is_some_and(|x| x > 0.0),
      Predicate::Present(f) => f.value(obs).is_some(),
      Predicate::TextEquals(f, v) => f.value(obs) == v,
      Predicate::Dated => obs.observed_at.is_some(),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// A validated, backend-neutral query over the observation store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyQuery {
  pub predicates: Vec<Predicate>,
  pub view:       View,
}

impl PropertyQuery {
  /// A query with no predicates.
  pub fn all(view: View) -> Self { Self { predicates: Vec::new(), view } }

  /// Validate `filters` and lower them to predicates.
  ///
  /// Returns [`Error::InvalidRange`] when any range has `min > max`.
  pub fn build(filters: &PropertyFilters, view: View) -> Result<Self> {
    filters.price.validate(Field::Price)?;
    filters
      .price_per_square_feet
      .validate(Field::PricePerSquareFeet)?;
    filters.squarefeet.validate(Field::SquareFeet)?;

    let mut predicates = Vec::new();
    filters.price.lower(Field::Price, &mut predicates);
    filters
      .price_per_square_feet
      .lower(Field::PricePerSquareFeet, &mut predicates);
    filters.squarefeet.lower(Field::SquareFeet, &mut predicates);

    if let Some(k) = filters.bedrooms {
      predicates.push(Predicate::Equals(Field::Bedrooms, f64::from(k)));
    }
    if let Some(k) = filters.bathrooms {
      predicates.push(Predicate::Equals(Field::Bathrooms, k));
    }

    for (field, value) in [
      (TextField::Zipcode, &filters.zipcode),
      (TextField::City, &filters.city),
      (TextField::State, &filters.state),
    ] {
      if let Some(v) = value {
        predicates.push(Predicate::TextEquals(field, v.clone()));
      }
    }

    Ok(Self { predicates, view })
  }

  /// AND one more predicate onto the query.
  pub fn and(mut self, predicate: Predicate) -> Self {
    self.predicates.push(predicate);
    self
  }

  pub fn with_view(mut self, view: View) -> Self {
    self.view = view;
    self
  }

  /// Whether `obs` passes every predicate. Ignores the view.
  pub fn matches(&self, obs: &Observation) -> bool {
    self.predicates.iter().all(|p| p.matches(obs))
  }

  /// Run the query over an in-memory table. The latest view is resolved over
  /// the whole table before predicates apply. Output is ordered by
  /// `(property_id, id)`.
  pub fn evaluate(&self, observations: &[Observation]) -> Vec<Observation> {
    let candidates: Vec<&Observation> = match self.view {
      View::Latest => latest_view(observations),
      View::History => observations.iter().collect(),
    };

    let mut rows: Vec<Observation> = candidates
      .into_iter()
      .filter(|o| self.matches(o))
      .cloned()
      .collect();
    rows.sort_by_key(|o| (o.property_id, o.id));
    rows
  }
}

/// The latest observation of every property.
///
/// Dated observations beat undated ones, later timestamps beat earlier ones,
/// and the highest row id breaks any remaining tie.
pub fn latest_view(observations: &[Observation]) -> Vec<&Observation> {
  let mut latest: BTreeMap<i64, &Observation> = BTreeMap::new();
  for obs in observations {
    latest
      .entry(obs.property_id)
      .and_modify(|cur| {
        if (obs.observed_at, obs.id) > (cur.observed_at, cur.id) {
          *cur = obs;
        }
      })
      .or_insert(obs);
  }
  latest.into_values().collect()
}
