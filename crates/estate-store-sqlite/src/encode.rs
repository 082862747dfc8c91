//! Encoding and decoding between domain types and SQLite columns.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text so that lexical
//! ordering in SQL matches chronological ordering.

use chrono::NaiveDateTime;
use estate_core::observation::{
  Observation, TIMESTAMP_FORMAT, format_timestamp,
};

use crate::{Error, Result};

/// Column list shared by every `SELECT` over `observations`.
pub const COLUMNS: &str = "id, property_id, address, city, state, zipcode, \
                           price, bedrooms, bathrooms, squarefeet, \
                           price_per_square_feet, observed_at";

pub fn encode_timestamp(dt: Option<NaiveDateTime>) -> Option<String> {
  dt.map(format_timestamp)
}

pub fn decode_timestamp(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
    .map_err(|e| Error::Decode(format!("observed_at {s:?}: {e}")))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Values read directly from an `observations` row, in [`COLUMNS`] order.
pub struct RawObservation {
  pub id:                    i64,
  pub property_id:           i64,
  pub address:               String,
  pub city:                  String,
  pub state:                 String,
  pub zipcode:               String,
  pub price:                 Option<f64>,
  pub bedrooms:              Option<i64>,
  pub bathrooms:             Option<f64>,
  pub squarefeet:            Option<f64>,
  pub price_per_square_feet: Option<f64>,
  pub observed_at:           Option<String>,
}

impl RawObservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      property_id:           row.get(1)?,
      address:               row.get(2)?,
      city:                  row.get(3)?,
      state:                 row.get(4)?,
      zipcode:               row.get(5)?,
      price:                 row.get(6)?,
      bedrooms:              row.get(7)?,
      bathrooms:             row.get(8)?,
      squarefeet:            row.get(9)?,
      price_per_square_feet: row.get(10)?,
      observed_at:           row.get(11)?,
    })
  }

  pub fn into_observation(self) -> Result<Observation> {
    let bedrooms = self
      .bedrooms
      .map(|b| {
        u32::try_from(b)
          .map_err(|_| Error::Decode(format!("bedrooms out of range: {b}")))
      })
      .transpose()?;

    Ok(Observation {
      id: self.id,
      property_id: self.property_id,
      address: self.address,
      city: self.city,
      state: self.state,
      zipcode: self.zipcode,
      price: self.price,
      bedrooms,
      bathrooms: self.bathrooms,
      squarefeet: self.squarefeet,
      price_per_square_feet: self.price_per_square_feet,
      observed_at: self.observed_at.as_deref().map(decode_timestamp).transpose()?,
    })
  }
}
