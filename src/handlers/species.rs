//! Species catalog endpoints. All public.

use axum::{
  extract::{
    rejection::{JsonRejection, QueryRejection},
    Query, State,
  },
  Json,
};
use serde::{Deserialize, Serialize};

use crate::db::{species as species_db, try_lock};
use crate::domain::{Feature, RangeProperties, Species, SpeciesImage, SpeciesListing};
use crate::error::{AppError, StorageContext};
use crate::state::AppState;

/// Page size when `limit` is absent
const DEFAULT_BATCH_LIMIT: i64 = 50;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesQuery {
  pub species_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
  pub species_name: String,
  pub season: String,
}

#[derive(Deserialize)]
pub struct BatchParams {
  pub limit: Option<i64>,
  #[serde(default)]
  pub after: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
  pub species: Vec<SpeciesListing>,
  /// Cursor for the following page, absent on the last one
  pub next_after: Option<String>,
}

fn required(field: &'static str, value: &str) -> Result<(), AppError> {
  if value.trim().is_empty() {
    return Err(AppError::MalformedInput(format!("{} is required", field)));
  }
  Ok(())
}

/// GET /api/species
pub async fn species_list(State(state): State<AppState>) -> Result<Json<Vec<Species>>, AppError> {
  let conn = try_lock(&state.db)?;
  let species = species_db::list_species(&conn).storage("select species")?;
  Ok(Json(species))
}

/// GET /api/species/batch?limit&after
pub async fn species_batch(
  State(state): State<AppState>,
  query: Result<Query<BatchParams>, QueryRejection>,
) -> Result<Json<BatchResponse>, AppError> {
  let Query(params) = query?;
  let limit = params
    .limit
    .unwrap_or(DEFAULT_BATCH_LIMIT)
    .clamp(1, species_db::MAX_BATCH_LIMIT);

  let page = {
    let conn = try_lock(&state.db)?;
    species_db::species_batch(&conn, limit, params.after.trim()).storage("select species batch")?
  };

  let next_after = if page.len() as i64 == limit {
    page.last().map(|s| s.scientific_name.clone())
  } else {
    None
  };
  Ok(Json(BatchResponse {
    species: page.into_iter().map(SpeciesListing::from).collect(),
    next_after,
  }))
}

/// POST /api/species/info
pub async fn species_info(
  State(state): State<AppState>,
  body: Result<Json<SpeciesQuery>, JsonRejection>,
) -> Result<Json<Species>, AppError> {
  let Json(query) = body?;
  required("speciesName", &query.species_name)?;

  let conn = try_lock(&state.db)?;
  species_db::find_species(&conn, query.species_name.trim())
    .storage("select species by name")?
    .map(Json)
    .ok_or(AppError::NotFound("Species"))
}

/// POST /api/species/geojson
pub async fn species_geojson(
  State(state): State<AppState>,
  body: Result<Json<RangeQuery>, JsonRejection>,
) -> Result<Json<Vec<Feature<RangeProperties>>>, AppError> {
  let Json(query) = body?;
  required("speciesName", &query.species_name)?;
  required("season", &query.season)?;

  let features = {
    let conn = try_lock(&state.db)?;
    species_db::species_ranges(&conn, query.species_name.trim(), query.season.trim())
      .storage("select species ranges")?
  };
  if features.is_empty() {
    return Err(AppError::NotFound("Species range"));
  }
  Ok(Json(features))
}

/// POST /api/species/images
pub async fn species_images(
  State(state): State<AppState>,
  body: Result<Json<SpeciesQuery>, JsonRejection>,
) -> Result<Json<Vec<SpeciesImage>>, AppError> {
  let Json(query) = body?;
  required("speciesName", &query.species_name)?;

  let conn = try_lock(&state.db)?;
  let images = species_db::species_images(&conn, query.species_name.trim())
    .storage("select species images")?;
  Ok(Json(images))
}
