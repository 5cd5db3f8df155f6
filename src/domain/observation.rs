use chrono::{DateTime, Utc};
use serde::Serialize;

use super::geo::{self, Feature};

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
  pub species_scientific_name: String,
  pub latitude: f64,
  pub longitude: f64,
  pub observed_at: DateTime<Utc>,
  pub approved: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationProperties {
  pub species_name: String,
  pub observed_at: DateTime<Utc>,
  pub approved: bool,
}

impl Observation {
  pub fn into_feature(self) -> Feature<ObservationProperties> {
    let geometry = geo::point(self.latitude, self.longitude);
    Feature::new(
      ObservationProperties {
        species_name: self.species_scientific_name,
        observed_at: self.observed_at,
        approved: self.approved,
      },
      geometry,
    )
  }
}
