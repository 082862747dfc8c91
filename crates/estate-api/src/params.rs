//! Query-string parameters shared by every listing endpoint.

use axum::{
  extract::{FromRequestParts, Query},
  http::request::Parts,
};
use estate_core::{
  page::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, PageRequest},
  query::{PropertyFilters, PropertyQuery, Range, View},
};
use serde::Deserialize;

use crate::error::ApiError;

/// Filters, view selector and pagination, all optional.
///
/// `latest` defaults to `true`; `page` and `page_size` default to 1 and 10.
#[derive(Debug, Deserialize, Default)]
pub struct ListingParams {
  pub price_min:                 Option<f64>,
  pub price_max:                 Option<f64>,
  pub price_per_square_feet_min: Option<f64>,
  pub price_per_square_feet_max: Option<f64>,
  pub squarefeet_min:            Option<f64>,
  pub squarefeet_max:            Option<f64>,
  pub bedrooms:                  Option<u32>,
  pub bathrooms:                 Option<f64>,
  pub zipcode:                   Option<String>,
  pub city:                      Option<String>,
  pub state:                     Option<String>,
  pub latest:                    Option<bool>,
  pub page:                      Option<u32>,
  pub page_size:                 Option<u32>,
}

impl ListingParams {
  pub fn filters(&self) -> PropertyFilters {
    PropertyFilters {
      price:                 Range { min: self.price_min, max: self.price_max },
      price_per_square_feet: Range {
        min: self.price_per_square_feet_min,
        max: self.price_per_square_feet_max,
      },
      squarefeet:            Range {
        min: self.squarefeet_min,
        max: self.squarefeet_max,
      },
      bedrooms:              self.bedrooms,
      bathrooms:             self.bathrooms,
      zipcode:               self.zipcode.clone(),
      city:                  self.city.clone(),
      state:                 self.state.clone(),
    }
  }

  pub fn view(&self) -> View { View::from_latest_flag(self.latest.unwrap_or(true)) }

  /// Validated query; an inverted range is a bad request.
  pub fn query(&self) -> Result<PropertyQuery, ApiError> {
    Ok(PropertyQuery::build(&self.filters(), self.view())?)
  }

  pub fn page(&self) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::new(
      self.page.unwrap_or(DEFAULT_PAGE),
      self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?)
  }
}

/// Extracted from the query string. A string that does not parse is a
/// [`ApiError::BadRequest`] with the usual JSON body.
impl<S> FromRequestParts<S> for ListingParams
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let Query(params) =
      Query::<ListingParams>::from_request_parts(parts, state).await?;
    Ok(params)
  }
}
