//! Statistics engine: quantiles, means and IQR-based outlier detection over a
//! numeric series.
//!
//! Quantiles use linear interpolation between order statistics (the "type 7"
//! definition used by most dataframe libraries), so results match what an
//! analyst would get from the same column in a notebook.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Multiplier applied to the interquartile range to place the outlier
/// fences.
pub const IQR_FENCE: f64 = 1.5;

// ─── Distribution ────────────────────────────────────────────────────────────

/// A non-empty, sorted numeric series.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
  sorted: Vec<f64>,
}

impl Distribution {
  /// Build a distribution, discarding NaNs and infinities.
  ///
  /// Returns [`Error::EmptyResultSet`] when nothing is left.
  pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self> {
    let mut sorted: Vec<f64> =
      values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
      return Err(Error::EmptyResultSet);
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(Self { sorted })
  }

  pub fn len(&self) -> usize { self.sorted.len() }

  /// Never true: construction fails on an empty series.
  pub fn is_empty(&self) -> bool { self.sorted.is_empty() }

  pub fn min(&self) -> f64 { self.sorted[0] }

  pub fn max(&self) -> f64 { self.sorted[self.sorted.len() - 1] }

  pub fn mean(&self) -> f64 {
    self.sorted.iter().sum::<f64>() / self.sorted.len() as f64
  }

  /// Type-7 quantile; `q` is clamped to `[0, 1]`.
  pub fn quantile(&self, q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let last = self.sorted.len() - 1;
    let h = last as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    let (a, b) = (self.sorted[lo], self.sorted[hi]);
    a + (h - lo as f64) * (b - a)
  }

  pub fn median(&self) -> f64 { self.quantile(0.5) }

  pub fn percentiles(&self) -> Percentiles {
    Percentiles {
      p25: self.quantile(0.25),
      p50: self.quantile(0.50),
      p75: self.quantile(0.75),
      p90: self.quantile(0.90),
      p99: self.quantile(0.99),
    }
  }

  pub fn outlier_bounds(&self) -> OutlierBounds {
    OutlierBounds::from_quartiles(self.quantile(0.25), self.quantile(0.75))
  }

  /// Box-plot style summary of the series.
  pub fn spread(&self) -> SpreadSummary {
    let bounds = self.outlier_bounds();
    SpreadSummary {
      count:       self.len(),
      min:         self.min(),
      p25:         self.quantile(0.25),
      median:      self.median(),
      p75:         self.quantile(0.75),
      max:         self.max(),
      lower_fence: bounds.lower,
      upper_fence: bounds.upper,
      outliers:    self
        .sorted
        .iter()
        .filter(|v| bounds.is_outlier(**v))
        .count(),
    }
  }
}

// ─── Summaries ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
  pub p25: f64,
  pub p50: f64,
  pub p75: f64,
  pub p90: f64,
  pub p99: f64,
}

/// Exclusive outlier fences at `Q1 − 1.5·IQR` and `Q3 + 1.5·IQR`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
  pub lower: f64,
  pub upper: f64,
}

impl OutlierBounds {
  pub fn from_quartiles(q1: f64, q3: f64) -> Self {
    let iqr = q3 - q1;
    Self {
      lower: q1 - IQR_FENCE * iqr,
      upper: q3 + IQR_FENCE * iqr,
    }
  }

  /// Values sitting exactly on a fence are not outliers.
  pub fn is_outlier(&self, value: f64) -> bool {
    value < self.lower || value > self.upper
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadSummary {
  pub count:       usize,
  pub min:         f64,
  pub p25:         f64,
  pub median:      f64,
  pub p75:         f64,
  pub max:         f64,
  pub lower_fence: f64,
  pub upper_fence: f64,
  pub outliers:    usize,
}

// ─── Outlier selection ───────────────────────────────────────────────────────

/// Keep the rows whose driving metric falls outside the IQR fences computed
/// over the same rows. Rows without a metric value neither contribute to the
/// fences nor appear in the result. Input order is preserved.
pub fn select_outliers<T>(
  rows: Vec<T>,
  metric: impl Fn(&T) -> Option<f64>,
) -> Result<Vec<T>> {
  let bounds = Distribution::new(rows.iter().filter_map(&metric))?
    .outlier_bounds();
  Ok(
    rows
      .into_iter()
      .filter(|row| metric(row).is_some_and(|v| bounds.is_outlier(v)))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  /// 95 regular prices plus five far above the rest.
  fn skewed_prices() -> Vec<f64> {
    (0..95_i32)
      .map(|i| 50_000.0 + f64::from(i) * 1000.0)
      .chain([1_000_000.0, 1_500_000.0, 2_000_000.0, 2_500_000.0, 3_000_000.0])
      .collect()
  }

  #[test]
  fn empty_series_is_an_error() {
    assert!(matches!(
      Distribution::new(Vec::<f64>::new()),
      Err(Error::EmptyResultSet)
    ));
    assert!(matches!(
      Distribution::new([f64::NAN, f64::INFINITY]),
      Err(Error::EmptyResultSet)
    ));
  }

  #[test]
  fn infinities_are_discarded() {
    let d =
      Distribution::new([f64::INFINITY, f64::INFINITY, 100_000.0]).unwrap();
    assert_eq!(d.len(), 1);
    let p = d.percentiles();
    assert_eq!((p.p25, p.p50, p.p99), (100_000.0, 100_000.0, 100_000.0));
    assert_eq!(d.mean(), 100_000.0);
  }

  #[test]
  fn type7_interpolation() {
    let d = Distribution::new([4.0, 1.0, 3.0, 2.0]).unwrap();
    // h = 3 * 0.25 = 0.75 → 1 + 0.75 * (2 - 1)
    assert_eq!(d.quantile(0.25), 1.75);
    assert_eq!(d.median(), 2.5);
    assert_eq!(d.quantile(0.75), 3.25);
    assert_eq!(d.quantile(0.0), 1.0);
    assert_eq!(d.quantile(1.0), 4.0);
  }

  #[test]
  fn single_value_series() {
    let d = Distribution::new([42.0]).unwrap();
    let p = d.percentiles();
    assert_eq!((p.p25, p.p50, p.p99), (42.0, 42.0, 42.0));
    assert_eq!(d.mean(), 42.0);
  }

  #[test]
  fn percentiles_are_monotonic_and_fences_enclose_quartiles() {
    let series = [
      vec![3.0, 1.0, 2.0],
      vec![10.0, 10.0, 10.0, 11.0],
      vec![-5.0, 0.0, 5.5, 100.0, 7.25, 7.25, 1e6],
      skewed_prices(),
    ];
    for s in series {
      let d = Distribution::new(s).unwrap();
      let p = d.percentiles();
      assert!(p.p25 <= p.p50 && p.p50 <= p.p75);
      assert!(p.p75 <= p.p90 && p.p90 <= p.p99);
      let b = d.outlier_bounds();
      assert!(b.lower <= p.p25 && b.upper >= p.p75);
    }
  }

  #[test]
  fn skewed_prices_have_five_high_outliers() {
    let d = Distribution::new(skewed_prices()).unwrap();
    assert_eq!(d.quantile(0.25), 74_750.0);
    assert_eq!(d.quantile(0.75), 124_250.0);

    let b = d.outlier_bounds();
    assert_eq!(b.upper, 198_500.0);

    let outliers = select_outliers(skewed_prices(), |v| Some(*v)).unwrap();
    assert_eq!(outliers, vec![
      1_000_000.0,
      1_500_000.0,
      2_000_000.0,
      2_500_000.0,
      3_000_000.0
    ]);
  }

  #[test]
  fn identical_values_collapse_fences() {
    let d = Distribution::new([100.0; 4]).unwrap();
    let b = d.outlier_bounds();
    assert_eq!((b.lower, b.upper), (100.0, 100.0));
    assert!(!b.is_outlier(100.0));
    assert!(b.is_outlier(99.0));
    assert!(b.is_outlier(101.0));
  }

  #[test]
  fn rows_without_metric_are_ignored() {
    let rows = vec![Some(1.0), None, Some(1.0), Some(1.0), Some(50.0)];
    let out = select_outliers(rows, |r| *r).unwrap();
    assert_eq!(out, vec![Some(50.0)]);
  }

  #[test]
  fn spread_counts_outliers() {
    let s = Distribution::new(skewed_prices()).unwrap().spread();
    assert_eq!(s.count, 100);
    assert_eq!(s.outliers, 5);
    assert_eq!(s.min, 50_000.0);
    assert_eq!(s.max, 3_000_000.0);
  }

  #[test]
  fn statistics_are_idempotent() {
    let a = Distribution::new(skewed_prices()).unwrap();
    let b = Distribution::new(skewed_prices()).unwrap();
    assert_eq!(a.percentiles(), b.percentiles());
    assert_eq!(a.mean(), b.mean());
  }
}
