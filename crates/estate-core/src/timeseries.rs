//! Time-series normalizer.
//!
//! Property histories are sparse: a listing is observed whenever the source
//! happened to scrape it. Averaging such data per month is biased by which
//! properties reported that month, so every property's series is first
//! forward-filled over the full calendar range and only then aggregated.

use std::{collections::BTreeMap, fmt};

use chrono::{Datelike, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::{
  buckets::{Accumulator, ListingAggregate},
  observation::Observation,
};

// ─── Month ───────────────────────────────────────────────────────────────────

/// A calendar month. Serialises as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
  pub year:  i32,
  /// 1-based.
  pub month: u32,
}

impl Month {
  pub fn new(year: i32, month: u32) -> Self { Self { year, month } }

  /// Truncate a timestamp to its month.
  pub fn of(dt: NaiveDateTime) -> Self {
    Self { year: dt.year(), month: dt.month() }
  }

  pub fn succ(self) -> Self {
    if self.month == 12 {
      Self { year: self.year + 1, month: 1 }
    } else {
      Self { year: self.year, month: self.month + 1 }
    }
  }

  /// Every month from `self` to `end`, inclusive. Empty when `end < self`.
  pub fn through(self, end: Month) -> impl Iterator<Item = Month> {
    std::iter::successors(Some(self), |m| Some(m.succ()))
      .take_while(move |m| *m <= end)
  }
}

impl fmt::Display for Month {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

impl Serialize for Month {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

// ─── Forward fill ────────────────────────────────────────────────────────────

/// One (property, month) cell of a normalised series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledPoint<T> {
  pub property_id: i64,
  pub month:       Month,
  pub value:       T,
  /// `true` when the value was carried forward from an earlier month.
  pub carried:     bool,
}

/// Normalise sparse `(property_id, observed_at, value)` points into a
/// month-by-month series per property.
///
/// - Timestamps are truncated to months; within one (property, month) the
///   last point in input order wins.
/// - The month range spans the earliest to the latest month across all
///   input.
/// - Gaps are filled with the property's most recent earlier value. Months
///   before a property's first observation stay empty.
///
/// Output is sorted by property, then month.
pub fn forward_fill<T: Clone>(
  points: impl IntoIterator<Item = (i64, NaiveDateTime, T)>,
) -> Vec<FilledPoint<T>> {
  let mut series: BTreeMap<i64, BTreeMap<Month, T>> = BTreeMap::new();
  for (property_id, at, value) in points {
    series
      .entry(property_id)
      .or_default()
      .insert(Month::of(at), value);
  }

  let months = series.values().flat_map(|s| s.keys().copied());
  let (Some(start), Some(end)) = (months.clone().min(), months.max()) else {
    return Vec::new();
  };

  let mut out = Vec::new();
  for (property_id, observed) in &series {
    let mut last: Option<&T> = None;
    for month in start.through(end) {
      let (value, carried) = match observed.get(&month) {
        Some(v) => (v, false),
        None => match last {
          Some(v) => (v, true),
          None => continue,
        },
      };
      last = Some(value);
      out.push(FilledPoint {
        property_id: *property_id,
        month,
        value: value.clone(),
        carried,
      });
    }
  }
  out
}

// ─── Readings ────────────────────────────────────────────────────────────────

/// The per-observation values carried through a trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
  pub zipcode:               String,
  pub price:                 f64,
  pub squarefeet:            Option<f64>,
  pub price_per_square_feet: Option<f64>,
}

impl Reading {
  /// A trend point for a dated, priced observation.
  pub fn point(obs: &Observation) -> Option<(i64, NaiveDateTime, Reading)> {
    let at = obs.observed_at?;
    let price = obs.price?;
    Some((obs.property_id, at, Reading {
      zipcode: obs.zipcode.clone(),
      price,
      squarefeet: obs.squarefeet,
      price_per_square_feet: obs.price_per_square_feet,
    }))
  }

  fn accumulate(&self, acc: &mut Accumulator) {
    acc.add(Some(self.price), self.price_per_square_feet, self.squarefeet);
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
  pub month:     Month,
  #[serde(flatten)]
  pub aggregate: ListingAggregate,
}

/// Collapse a filled series to one aggregate per month, across properties.
pub fn monthly_trend(points: &[FilledPoint<Reading>]) -> Vec<MonthlyTrend> {
  let mut by_month: BTreeMap<Month, Accumulator> = BTreeMap::new();
  for p in points {
    p.value.accumulate(by_month.entry(p.month).or_default());
  }
  by_month
    .into_iter()
    .filter_map(|(month, acc)| {
      acc.finish().map(|aggregate| MonthlyTrend { month, aggregate })
    })
    .collect()
}

/// Collapse a filled series to one aggregate per (month, zipcode). Points
/// with an empty zipcode are skipped. Ordered by month, then zipcode.
pub fn zipcode_monthly(
  points: &[FilledPoint<Reading>],
) -> Vec<(Month, String, ListingAggregate)> {
  let mut cells: BTreeMap<(Month, &str), Accumulator> = BTreeMap::new();
  for p in points.iter().filter(|p| !p.value.zipcode.is_empty()) {
    p.value
      .accumulate(cells.entry((p.month, p.value.zipcode.as_str())).or_default());
  }
  cells
    .into_iter()
    .filter_map(|((month, zip), acc)| {
      acc.finish().map(|agg| (month, zip.to_owned(), agg))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observation::parse_timestamp;

  fn ts(s: &str) -> NaiveDateTime { parse_timestamp(s).unwrap() }

  #[test]
  fn month_iteration_crosses_year_boundary() {
    let months: Vec<String> = Month::new(2022, 11)
      .through(Month::new(2023, 2))
      .map(|m| m.to_string())
      .collect();
    assert_eq!(months, ["2022-11", "2022-12", "2023-01", "2023-02"]);
    assert_eq!(Month::new(2023, 2).through(Month::new(2023, 1)).count(), 0);
  }

  #[test]
  fn gap_is_filled_from_previous_month() {
    let filled = forward_fill([
      (1, ts("2023-01-15 00:00:00"), 100.0),
      (1, ts("2023-03-02 00:00:00"), 300.0),
    ]);
    let cells: Vec<(Month, f64, bool)> =
      filled.iter().map(|p| (p.month, p.value, p.carried)).collect();
    assert_eq!(cells, vec![
      (Month::new(2023, 1), 100.0, false),
      (Month::new(2023, 2), 100.0, true),
      (Month::new(2023, 3), 300.0, false),
    ]);
  }

  #[test]
  fn no_back_fill_before_first_observation() {
    let filled = forward_fill([
      (1, ts("2023-01-01 00:00:00"), 1.0),
      (2, ts("2023-03-01 00:00:00"), 2.0),
    ]);
    let p2: Vec<Month> = filled
      .iter()
      .filter(|p| p.property_id == 2)
      .map(|p| p.month)
      .collect();
    assert_eq!(p2, vec![Month::new(2023, 3)]);

    // Property 1 is carried through to the global end of the range.
    let p1 = filled.iter().filter(|p| p.property_id == 1).count();
    assert_eq!(p1, 3);
  }

  #[test]
  fn last_point_within_a_month_wins() {
    let filled = forward_fill([
      (1, ts("2023-01-20 00:00:00"), 2.0),
      (1, ts("2023-01-05 00:00:00"), 1.0),
    ]);
    assert_eq!(filled.len(), 1);
    assert_eq!(filled[0].value, 1.0);
  }

  #[test]
  fn output_is_sorted_by_property_then_month() {
    let filled = forward_fill([
      (9, ts("2023-02-01 00:00:00"), 0),
      (3, ts("2023-01-01 00:00:00"), 0),
      (9, ts("2023-01-01 00:00:00"), 0),
    ]);
    let keys: Vec<(i64, Month)> =
      filled.iter().map(|p| (p.property_id, p.month)).collect();
    assert_eq!(keys, vec![
      (3, Month::new(2023, 1)),
      (3, Month::new(2023, 2)),
      (9, Month::new(2023, 1)),
      (9, Month::new(2023, 2)),
    ]);
  }

  #[test]
  fn empty_input_yields_empty_series() {
    assert!(forward_fill(Vec::<(i64, NaiveDateTime, f64)>::new()).is_empty());
  }

  fn reading(zip: &str, price: f64) -> Reading {
    Reading {
      zipcode: zip.into(),
      price,
      squarefeet: Some(1000.0),
      price_per_square_feet: Some(price / 1000.0),
    }
  }

  #[test]
  fn trend_averages_filled_months() {
    // Property 2 only reports in January; without filling, February's
    // average would be property 1 alone.
    let filled = forward_fill([
      (1, ts("2023-01-01 00:00:00"), reading("33101", 100_000.0)),
      (2, ts("2023-01-01 00:00:00"), reading("33101", 300_000.0)),
      (1, ts("2023-02-01 00:00:00"), reading("33101", 110_000.0)),
    ]);
    let trend = monthly_trend(&filled);
    assert_eq!(trend.len(), 2);
    assert_eq!(trend[0].aggregate.average_price, Some(200_000.0));
    assert_eq!(trend[1].month, Month::new(2023, 2));
    assert_eq!(trend[1].aggregate.listings, 2);
    assert_eq!(trend[1].aggregate.average_price, Some(205_000.0));
  }

  #[test]
  fn zipcode_cells_are_month_major() {
    let filled = forward_fill([
      (1, ts("2023-01-01 00:00:00"), reading("33139", 100.0)),
      (2, ts("2023-01-01 00:00:00"), reading("33101", 300.0)),
      (3, ts("2023-02-01 00:00:00"), reading("", 300.0)),
    ]);
    let cells: Vec<(String, String)> = zipcode_monthly(&filled)
      .into_iter()
      .map(|(m, z, _)| (m.to_string(), z))
      .collect();
    assert_eq!(cells, vec![
      ("2023-01".to_string(), "33101".to_string()),
      ("2023-01".to_string(), "33139".to_string()),
      ("2023-02".to_string(), "33101".to_string()),
      ("2023-02".to_string(), "33139".to_string()),
    ]);
  }
}
