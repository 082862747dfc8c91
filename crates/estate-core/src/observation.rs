//! Observation types: one row per ingested snapshot of a property.
//!
//! Observations are never updated in place. A property whose price or
//! attributes change over time simply accumulates more observations; the
//! "latest" and "historic" views are resolved at query time.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Canonical text form of `observed_at`. Lexical order equals chronological
/// order, which the SQL latest-view relies on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a listing timestamp. Accepts the canonical form and a bare date
/// (midnight).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
  let s = s.trim();
  if let Ok(dt) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
    return Ok(dt);
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .ok_or_else(|| Error::InvalidTimestamp(s.to_owned()))
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
  dt.format(TIMESTAMP_FORMAT).to_string()
}

/// `price / squarefeet` when both are finite and strictly positive.
pub fn price_per_square_feet(
  price: Option<f64>,
  squarefeet: Option<f64>,
) -> Option<f64> {
  match (positive(price), positive(squarefeet)) {
    (Some(p), Some(sq)) => Some(p / sq).filter(|v| v.is_finite()),
    _ => None,
  }
}

fn positive(v: Option<f64>) -> Option<f64> {
  v.filter(|x| x.is_finite() && *x > 0.0)
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// A stored snapshot of a property at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  /// Store-assigned row id; increases with insertion order.
  pub id:                    i64,
  pub property_id:           i64,
  pub address:               String,
  pub city:                  String,
  pub state:                 String,
  pub zipcode:               String,
  /// `None` means the price is unknown. Zero is never stored.
  pub price:                 Option<f64>,
  pub bedrooms:              Option<u32>,
  pub bathrooms:             Option<f64>,
  pub squarefeet:            Option<f64>,
  /// Derived at insert time; see [`price_per_square_feet`].
  pub price_per_square_feet: Option<f64>,
  /// `None` means the snapshot carries no temporal information.
  pub observed_at:           Option<NaiveDateTime>,
}

impl Observation {
  /// Price and area, when both are known and positive.
  pub fn priced_area(&self) -> Option<(f64, f64)> {
    match (self.price, self.squarefeet) {
      (Some(p), Some(sq)) if p > 0.0 && sq > 0.0 => Some((p, sq)),
      _ => None,
    }
  }
}

// ─── NewObservation ──────────────────────────────────────────────────────────

/// Input to [`crate::store::ListingStore::insert_batch`].
/// `id` and `price_per_square_feet` are always set by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
  pub property_id: i64,
  pub address:     String,
  pub city:        String,
  pub state:       String,
  pub zipcode:     String,
  pub price:       Option<f64>,
  pub bedrooms:    Option<u32>,
  pub bathrooms:   Option<f64>,
  pub squarefeet:  Option<f64>,
  pub observed_at: Option<NaiveDateTime>,
}

impl NewObservation {
  /// Convenience constructor with every optional field unset.
  pub fn new(property_id: i64) -> Self {
    Self {
      property_id,
      address: String::new(),
      city: String::new(),
      state: String::new(),
      zipcode: String::new(),
      price: None,
      bedrooms: None,
      bathrooms: None,
      squarefeet: None,
      observed_at: None,
    }
  }

  /// Apply the storage policy: non-positive or non-finite prices and areas
  /// become unknown, negative bathroom counts are dropped.
  pub fn normalize(mut self) -> Self {
    self.price = positive(self.price);
    self.squarefeet = positive(self.squarefeet);
    self.bathrooms = self.bathrooms.filter(|b| b.is_finite() && *b >= 0.0);
    self
  }

  pub fn price_per_square_feet(&self) -> Option<f64> {
    price_per_square_feet(self.price, self.squarefeet)
  }

  /// Materialise the stored row. Normalises first.
  pub fn into_observation(self, id: i64) -> Observation {
    let new = self.normalize();
    let price_per_square_feet = new.price_per_square_feet();
    Observation {
      id,
      property_id: new.property_id,
      address: new.address,
      city: new.city,
      state: new.state,
      zipcode: new.zipcode,
      price: new.price,
      bedrooms: new.bedrooms,
      bathrooms: new.bathrooms,
      squarefeet: new.squarefeet,
      price_per_square_feet,
      observed_at: new.observed_at,
    }
  }
}

// ─── Property ────────────────────────────────────────────────────────────────

/// The API projection of an observation: everything except the internal row
/// id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
  pub property_id:           i64,
  pub address:               String,
  pub city:                  String,
  pub state:                 String,
  pub zipcode:               String,
  pub price:                 Option<f64>,
  pub bedrooms:              Option<u32>,
  pub bathrooms:             Option<f64>,
  pub squarefeet:            Option<f64>,
  pub price_per_square_feet: Option<f64>,
  pub observed_at:           Option<NaiveDateTime>,
}

impl From<Observation> for Property {
  fn from(o: Observation) -> Self {
    Property {
      property_id:           o.property_id,
      address:               o.address,
      city:                  o.city,
      state:                 o.state,
      zipcode:               o.zipcode,
      price:                 o.price,
      bedrooms:              o.bedrooms,
      bathrooms:             o.bathrooms,
      squarefeet:            o.squarefeet,
      price_per_square_feet: o.price_per_square_feet,
      observed_at:           o.observed_at,
    }
  }
}
