//! JSON REST API for the listing store.
//!
//! Exposes an axum [`Router`] backed by any
//! [`estate_core::store::ListingStore`]. Transport concerns (binding, request
//! tracing) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = estate_api::api_router(Arc::new(store));
//! ```

pub mod error;
pub mod params;
pub mod properties;
pub mod visualization;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use estate_core::store::ListingStore;
use serde_json::{Value, json};

pub use error::ApiError;

/// `GET /`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ListingStore + 'static,
{
  Router::new()
    .route("/", get(health))
    // Properties
    .route("/property", get(properties::list::<S>))
    .route("/property/", get(properties::list::<S>))
    .route("/property/statistics", get(properties::statistics::<S>))
    .route("/property/outliers/price", get(properties::price_outliers::<S>))
    .route(
      "/property/outliers/price-per-sqft",
      get(properties::price_per_sqft_outliers::<S>),
    )
    // Chart data
    .route("/visualization/property/price", get(visualization::price::<S>))
    .route("/visualization/property/rooms", get(visualization::rooms::<S>))
    .route(
      "/visualization/property/historical-price",
      get(visualization::historical_price::<S>),
    )
    .route(
      "/visualization/property/zipcodes",
      get(visualization::zipcodes::<S>),
    )
    .route(
      "/visualization/property/historical-zipcodes",
      get(visualization::historical_zipcodes::<S>),
    )
    .route(
      "/visualization/property/price-vs-zipcode",
      get(visualization::price_vs_zipcode::<S>),
    )
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use estate_core::{
    memory::MemoryStore,
    observation::{NewObservation, parse_timestamp},
  };
  use tower::ServiceExt as _;

  async fn seeded() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    let mut rows: Vec<NewObservation> = (0..95_i32)
      .map(|i| {
        let i_f = f64::from(i);
        let mut new = NewObservation::new(i64::from(i) + 1);
        new.price = Some(50_000.0 + i_f * 1000.0);
        new.squarefeet = Some(500.0 + i_f * 10.0);
        new.bedrooms = Some((i % 4) as u32);
        new.zipcode = "33139".into();
        new.city = "Miami".into();
        let day = if i % 2 == 0 { "2023-01-05" } else { "2023-03-05" };
        new.observed_at = Some(parse_timestamp(day).unwrap());
        new
      })
      .collect();
    for (k, price) in [1e6, 1.5e6, 2e6, 2.5e6, 3e6].into_iter().enumerate() {
      let mut new = NewObservation::new(96 + k as i64);
      new.price = Some(price);
      new.squarefeet = Some(price / 1000.0);
      new.zipcode = "33101".into();
      new.city = "Miami".into();
      rows.push(new);
    }
    store.insert_batch(rows).await.unwrap();
    Arc::new(store)
  }

  async fn get_json(uri: &str) -> (StatusCode, Value) {
    let app = api_router(seeded().await);
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
  }

  #[tokio::test]
  async fn health_check() {
    let (status, body) = get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn list_defaults_to_first_page() {
    let (status, body) = get_json("/property/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 100);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 10);
    assert_eq!(body["results"].as_array().unwrap().len(), 10);
    assert_eq!(body["results"][0]["property_id"], 1);
  }

  #[tokio::test]
  async fn list_applies_filters() {
    let (status, body) =
      get_json("/property/?zipcode=33101&price_min=2000000&page_size=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
  }

  #[tokio::test]
  async fn statistics_shape() {
    let (status, body) = get_json("/property/statistics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_properties"], 100);
    assert_eq!(body["outlier_properties_count"], 5);
    assert_eq!(body["median_price"], 99_500.0);
    assert_eq!(body["percentiles"]["percentile_25_price"], 74_750.0);
  }

  #[tokio::test]
  async fn empty_result_is_404() {
    let (status, body) = get_json("/property/statistics?city=Tampa").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no data"));
  }

  #[tokio::test]
  async fn inverted_range_is_400() {
    let (status, body) =
      get_json("/property/?price_min=500&price_max=100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("price"));
  }

  #[tokio::test]
  async fn zero_page_is_400() {
    let (status, _) = get_json("/property/?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unparseable_query_is_400() {
    let (status, body) = get_json("/property/?price_min=cheap").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("query string"));

    let (status, body) =
      get_json("/visualization/property/rooms?latest=maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn outlier_endpoints() {
    let (status, body) = get_json("/property/outliers/price").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["results"][0]["property_id"], 96);

    let (status, body) = get_json("/property/outliers/price-per-sqft").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
  }

  #[tokio::test]
  async fn chart_data_endpoints() {
    let (status, body) = get_json("/visualization/property/price").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 13);

    let (status, body) = get_json("/visualization/property/rooms").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["label"], "0");
    assert_eq!(body[0]["count"], 24);

    let (status, body) =
      get_json("/visualization/property/historical-price").await;
    assert_eq!(status, StatusCode::OK);
    let months: Vec<&str> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|m| m["month"].as_str().unwrap())
      .collect();
    assert_eq!(months, ["2023-01", "2023-02", "2023-03"]);

    let (status, body) = get_json("/visualization/property/zipcodes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["zipcode"], "33101");
    assert_eq!(body[0]["listings"], 5);
    assert_eq!(body[0]["price_range"], "2M-4M");

    let (status, body) =
      get_json("/visualization/property/historical-zipcodes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().iter().all(|c| c["zipcode"] == "33139"));

    let (status, body) =
      get_json("/visualization/property/price-vs-zipcode").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["price"]["count"], 95);
  }
}
