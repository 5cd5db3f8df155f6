use serde::Serialize;
use serde_json::{json, Value};

/// A GeoJSON `Feature` with typed properties.
#[derive(Debug, Clone, Serialize)]
pub struct Feature<P> {
  #[serde(rename = "type")]
  kind: &'static str,
  pub properties: P,
  pub geometry: Value,
}

impl<P> Feature<P> {
  pub fn new(properties: P, geometry: Value) -> Self {
    Self {
      kind: "Feature",
      properties,
      geometry,
    }
  }
}

/// GeoJSON point geometry. Note the longitude-first coordinate order.
pub fn point(latitude: f64, longitude: f64) -> Value {
  json!({ "type": "Point", "coordinates": [longitude, latitude] })
}

pub fn is_valid_latitude(lat: f64) -> bool {
  lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

pub fn is_valid_longitude(lon: f64) -> bool {
  lon.is_finite() && (-180.0..=180.0).contains(&lon)
}
