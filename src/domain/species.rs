use serde::{Deserialize, Serialize};

/// IUCN Red List category, the basis of challenge scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConservationStatus {
  LeastConcern,
  NearThreatened,
  Vulnerable,
  Endangered,
  CriticallyEndangered,
}

impl ConservationStatus {
  /// Accepts either the two-letter code or the full category name.
  pub fn from_label(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "lc" | "least concern" => Some(Self::LeastConcern),
      "nt" | "near threatened" => Some(Self::NearThreatened),
      "vu" | "vulnerable" => Some(Self::Vulnerable),
      "en" | "endangered" => Some(Self::Endangered),
      "cr" | "critically endangered" => Some(Self::CriticallyEndangered),
      _ => None,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::LeastConcern => "LC",
      Self::NearThreatened => "NT",
      Self::Vulnerable => "VU",
      Self::Endangered => "EN",
      Self::CriticallyEndangered => "CR",
    }
  }

  /// Normalise a free-text status to its code; unknown values pass through.
  pub fn normalize(raw: &str) -> String {
    Self::from_label(raw)
      .map(|s| s.code().to_string())
      .unwrap_or_else(|| raw.trim().to_string())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
  pub scientific_name: String,
  pub common_name: String,
  #[serde(default)]
  pub family: Option<String>,
  #[serde(default)]
  pub order_name: Option<String>,
  #[serde(default)]
  pub diet: Option<String>,
  #[serde(default)]
  pub conservation_status: Option<String>,
}

/// Catalog listing entry, as consumed by the paginated species browser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesListing {
  pub scientific_name: String,
  pub common_name: String,
  pub family: Option<String>,
  pub order_name: Option<String>,
  pub diet: Option<String>,
  pub conservation_status: Option<String>,
}

impl From<Species> for SpeciesListing {
  fn from(s: Species) -> Self {
    Self {
      scientific_name: s.scientific_name,
      common_name: s.common_name,
      family: s.family,
      order_name: s.order_name,
      diet: s.diet,
      conservation_status: s.conservation_status,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesImage {
  pub url: String,
  pub license: Option<String>,
  pub contributor: Option<String>,
}

/// Properties attached to a seasonal range feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeProperties {
  pub species_scientific_name: String,
  pub season: String,
}
