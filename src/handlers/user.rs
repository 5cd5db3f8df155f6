//! Signed-in user's profile and observations.

use axum::{
  extract::{rejection::JsonRejection, State},
  http::StatusCode,
  Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{db::UserInfo, AuthUser};
use crate::db::{observations, species as species_db, try_lock};
use crate::domain::{geo, Feature, ObservationProperties};
use crate::error::{AppError, StorageContext};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObservation {
  pub species: String,
  pub latitude: f64,
  pub longitude: f64,
  pub observed_at: DateTime<Utc>,
}

/// POST /api/user
pub async fn user_info(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserInfo>, AppError> {
  let conn = try_lock(&state.db)?;
  crate::auth::db::get_user_by_id(&conn, auth.user_id)
    .storage("select user")?
    .map(Json)
    .ok_or(AppError::NotFound("User"))
}

/// POST /api/user/observations - Observations as GeoJSON point features
pub async fn user_observations(
  State(state): State<AppState>,
  auth: AuthUser,
) -> Result<Json<Vec<Feature<ObservationProperties>>>, AppError> {
  let conn = try_lock(&state.db)?;
  let features = observations::get_user_observations(&conn, auth.user_id)
    .storage("select observations")?
    .into_iter()
    .map(|o| o.into_feature())
    .collect();
  Ok(Json(features))
}

/// POST /api/user/observations/new
pub async fn new_observation(
  State(state): State<AppState>,
  auth: AuthUser,
  body: Result<Json<NewObservation>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
  let Json(obs) = body?;
  if !geo::is_valid_latitude(obs.latitude) || !geo::is_valid_longitude(obs.longitude) {
    return Err(AppError::MalformedInput(
      "Latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
    ));
  }

  let conn = try_lock(&state.db)?;
  let scientific_name = species_db::resolve_scientific_name(&conn, obs.species.trim())
    .storage("resolve species")?
    .ok_or(AppError::NotFound("Species"))?;

  let id = observations::insert_observation(
    &conn,
    auth.user_id,
    &scientific_name,
    obs.latitude,
    obs.longitude,
    obs.observed_at,
  )
  .storage("insert observation")?;
  tracing::info!("User {} recorded observation {} of {}", auth.user_id, id, scientific_name);

  Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}
