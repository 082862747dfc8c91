//! Range bucketing and categorical summaries.
//!
//! Buckets are left-closed: a value `v` belongs to bucket `i` when
//! `bounds[i] <= v < bounds[i + 1]`, and the last bucket is unbounded above.
//! Values below the first bound (or NaN) belong to no bucket and are not
//! counted.

use serde::Serialize;

// ─── Buckets ─────────────────────────────────────────────────────────────────

/// An ordered set of left-closed ranges with display labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buckets {
  /// Lower bound of each bucket, strictly increasing.
  bounds: &'static [f64],
  labels: &'static [&'static str],
}

impl Buckets {
  /// `bounds` and `labels` must have the same length.
  pub const fn new(
    bounds: &'static [f64],
    labels: &'static [&'static str],
  ) -> Self {
    assert!(bounds.len() == labels.len());
    Self { bounds, labels }
  }

  pub fn labels(&self) -> &'static [&'static str] { self.labels }

  /// Label of the bucket containing `value`, if any.
  pub fn classify(&self, value: f64) -> Option<&'static str> {
    if value.is_nan() {
      return None;
    }
    match self.bounds.partition_point(|b| *b <= value) {
      0 => None,
      n => Some(self.labels[n - 1]),
    }
  }

  /// Count `values` per bucket. Every bucket appears, in order, including
  /// empty ones.
  pub fn histogram(
    &self,
    values: impl IntoIterator<Item = f64>,
  ) -> Vec<BucketCount> {
    let mut counts = vec![0usize; self.labels.len()];
    for v in values {
      if v.is_nan() {
        continue;
      }
      if let Some(i) = self.bounds.partition_point(|b| *b <= v).checked_sub(1)
      {
        counts[i] += 1;
      }
    }
    self
      .labels
      .iter()
      .copied()
      .zip(counts)
      .map(|(label, count)| BucketCount { label, count })
      .collect()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketCount {
  pub label: &'static str,
  pub count: usize,
}

// ─── Bucket sets ─────────────────────────────────────────────────────────────

pub const PRICE_BANDS: Buckets = Buckets::new(
  &[0.0, 100_000.0, 300_000.0, 500_000.0, 700_000.0, 1_000_000.0, 2_000_000.0, 4_000_000.0],
  &["<100k", "100k-300k", "300k-500k", "500k-700k", "700k-1M", "1M-2M", "2M-4M", ">4M"],
);

pub const PRICE_PER_SQFT_BANDS: Buckets = Buckets::new(
  &[0.0, 100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 800.0, 1000.0, 1200.0, 1600.0],
  &[
    "<100", "100-200", "200-300", "300-400", "400-500", "500-600", "600-800",
    "800-1000", "1000-1200", "1200-1600", ">1600",
  ],
);

pub const AREA_BANDS: Buckets = Buckets::new(
  &[0.0, 1000.0, 2000.0, 3000.0, 4000.0, 5000.0],
  &["<1000", "1000-2000", "2000-3000", "3000-4000", "4000-5000", ">5000"],
);

/// `5+` collects six bedrooms and more.
pub const BEDROOM_BANDS: Buckets = Buckets::new(
  &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
  &["0", "1", "2", "3", "4", "5", "5+"],
);

/// Finer price bands for the distribution histogram.
pub const PRICE_HISTOGRAM_BANDS: Buckets = Buckets::new(
  &[
    0.0, 100_000.0, 200_000.0, 300_000.0, 400_000.0, 500_000.0, 750_000.0,
    1_000_000.0, 1_500_000.0, 2_000_000.0, 3_000_000.0, 4_000_000.0,
    5_000_000.0,
  ],
  &[
    "<100k", "100k-200k", "200k-300k", "300k-400k", "400k-500k", "500k-750k",
    "750k-1M", "1M-1.5M", "1.5M-2M", "2M-3M", "3M-4M", "4M-5M", ">5M",
  ],
);

// ─── Group aggregates ────────────────────────────────────────────────────────

/// Running sums for one group of listings.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
  listings:  usize,
  price_sum: f64,
  price_n:   usize,
  ppsf_sum:  f64,
  ppsf_n:    usize,
  area_sum:  f64,
  area_n:    usize,
}

impl Accumulator {
  /// Every call counts as a listing; absent values only skip their average.
  pub fn add(
    &mut self,
    price: Option<f64>,
    ppsf: Option<f64>,
    area: Option<f64>,
  ) {
    self.listings += 1;
    if let Some(v) = price {
      self.price_sum += v;
      self.price_n += 1;
    }
    if let Some(v) = ppsf {
      self.ppsf_sum += v;
      self.ppsf_n += 1;
    }
    if let Some(v) = area {
      self.area_sum += v;
      self.area_n += 1;
    }
  }

  /// `None` for an empty group.
  pub fn finish(self) -> Option<ListingAggregate> {
    if self.listings == 0 {
      return None;
    }
    let mean = |sum: f64, n: usize| (n > 0).then(|| sum / n as f64);
    Some(ListingAggregate {
      listings:               self.listings,
      average_price:          mean(self.price_sum, self.price_n),
      average_price_per_sqft: mean(self.ppsf_sum, self.ppsf_n),
      average_area:           mean(self.area_sum, self.area_n),
    })
  }
}

/// Averages over a group of listings. Optional averages are absent when no
/// listing in the group carried that value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingAggregate {
  pub listings:               usize,
  pub average_price:          Option<f64>,
  pub average_price_per_sqft: Option<f64>,
  pub average_area:           Option<f64>,
}

impl ListingAggregate {
  pub fn bands(&self) -> BandLabels {
    BandLabels {
      price_range:                self
        .average_price
        .and_then(|v| PRICE_BANDS.classify(v)),
      price_per_squarefeet_range: self
        .average_price_per_sqft
        .and_then(|v| PRICE_PER_SQFT_BANDS.classify(v)),
      area_range:                 self
        .average_area
        .and_then(|v| AREA_BANDS.classify(v)),
    }
  }
}

/// Categorical labels for a [`ListingAggregate`], used to colour map regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandLabels {
  pub price_range:                Option<&'static str>,
  pub price_per_squarefeet_range: Option<&'static str>,
  pub area_range:                 Option<&'static str>,
}
