//! Ingestion row policy: raw listing rows to [`NewObservation`]s.
//!
//! File handling and batching live in the server binary; this module only
//! decides what a single row means.

use serde::Deserialize;

use crate::{
  Error, Result,
  observation::{NewObservation, parse_timestamp},
};

/// A listing row as it appears in the source CSV. Every column is optional at
/// this stage; [`RawListing::into_new_observation`] enforces what is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawListing {
  pub propertyid: Option<i64>,
  pub address:    Option<String>,
  pub city:       Option<String>,
  pub state:      Option<String>,
  pub zipcode:    Option<String>,
  pub price:      Option<f64>,
  pub bedrooms:   Option<f64>,
  pub bathrooms:  Option<f64>,
  pub squarefeet: Option<f64>,
  pub datelisted: Option<String>,
}

impl RawListing {
  /// Validate and convert the row. Prices and areas are normalised by
  /// [`NewObservation::normalize`].
  pub fn into_new_observation(self) -> Result<NewObservation> {
    let property_id =
      self.propertyid.ok_or(Error::MissingRequiredField("propertyid"))?;

    let observed_at = match self.datelisted.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(s) => Some(parse_timestamp(s)?),
    };

    Ok(
      NewObservation {
        property_id,
        address: text(self.address),
        city: text(self.city),
        state: text(self.state),
        zipcode: text(self.zipcode),
        price: self.price,
        bedrooms: self.bedrooms.and_then(whole_count),
        bathrooms: self.bathrooms,
        squarefeet: self.squarefeet,
        observed_at,
      }
      .normalize(),
    )
  }
}

fn text(v: Option<String>) -> String {
  v.map(|s| s.trim().to_owned()).unwrap_or_default()
}

/// Source files carry room counts as floats (`3.0`).
fn whole_count(v: f64) -> Option<u32> {
  (v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX)).then_some(v as u32)
}

// ─── Sanity filter ───────────────────────────────────────────────────────────

/// Plausibility limits for listing prices. Rows outside them are usually
/// data-entry errors (a price typed in cents, a lot size in place of the
/// living area) and can be dropped at load time.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SanityBounds {
  pub max_price: f64,
  pub min_price: f64,
  pub min_price_per_square_feet: f64,
  pub max_price_per_square_feet: f64,
}

impl Default for SanityBounds {
  fn default() -> Self {
    Self {
      max_price: 500_000_000.0,
      min_price: 150.0,
      min_price_per_square_feet: 1.0,
      max_price_per_square_feet: 100_000.0,
    }
  }
}

impl SanityBounds {
  /// Only values that are present are checked.
  pub fn accepts(&self, obs: &NewObservation) -> bool {
    let price_ok = obs
      .price
      .is_none_or(|p| (self.min_price..=self.max_price).contains(&p));
    let ppsf_ok = obs.price_per_square_feet().is_none_or(|v| {
      (self.min_price_per_square_feet..=self.max_price_per_square_feet)
        .contains(&v)
    });
    price_ok && ppsf_ok
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row() -> RawListing {
    RawListing {
      propertyid: Some(42),
      address: Some(" 1 Ocean Dr ".into()),
      city: Some("Miami".into()),
      state: Some("FL".into()),
      zipcode: Some("33139".into()),
      price: Some(450_000.0),
      bedrooms: Some(3.0),
      bathrooms: Some(2.5),
      squarefeet: Some(1500.0),
      datelisted: Some("2023-05-01 10:00:00".into()),
    }
  }

  #[test]
  fn converts_a_complete_row() {
    let new = row().into_new_observation().unwrap();
    assert_eq!(new.property_id, 42);
    assert_eq!(new.address, "1 Ocean Dr");
    assert_eq!(new.bedrooms, Some(3));
    assert_eq!(new.price_per_square_feet(), Some(300.0));
    assert!(new.observed_at.is_some());
  }

  #[test]
  fn missing_property_id_is_rejected() {
    let raw = RawListing { propertyid: None, ..row() };
    assert!(matches!(
      raw.into_new_observation(),
      Err(Error::MissingRequiredField("propertyid"))
    ));
  }

  #[test]
  fn blank_date_is_undated_but_garbage_is_an_error() {
    let blank = RawListing { datelisted: Some("  ".into()), ..row() };
    assert_eq!(blank.into_new_observation().unwrap().observed_at, None);

    let bad = RawListing { datelisted: Some("05/01/2023".into()), ..row() };
    assert!(matches!(
      bad.into_new_observation(),
      Err(Error::InvalidTimestamp(_))
    ));
  }

  #[test]
  fn zero_price_becomes_unknown() {
    let raw = RawListing { price: Some(0.0), ..row() };
    let new = raw.into_new_observation().unwrap();
    assert_eq!(new.price, None);
    assert_eq!(new.price_per_square_feet(), None);
  }

  #[test]
  fn invalid_bedroom_counts_are_unknown_but_keep_the_row() {
    for bad in [2.5, -1.0, f64::NAN] {
      let raw = RawListing { bedrooms: Some(bad), ..row() };
      let new = raw.into_new_observation().unwrap();
      assert_eq!(new.bedrooms, None);
      assert_eq!(new.property_id, 42);
    }
  }

  #[test]
  fn sanity_bounds() {
    let bounds = SanityBounds::default();
    let accepts = |price: Option<f64>, sqft: Option<f64>| {
      let mut new = NewObservation::new(1);
      new.price = price;
      new.squarefeet = sqft;
      bounds.accepts(&new)
    };
    assert!(accepts(Some(300_000.0), Some(1500.0)));
    assert!(accepts(None, None));
    assert!(!accepts(Some(100.0), None));
    assert!(!accepts(Some(6e8), None));
    // $0.50 per square foot.
    assert!(!accepts(Some(1000.0), Some(2000.0)));
    assert!(!accepts(Some(2e8), Some(100.0)));
  }
}
