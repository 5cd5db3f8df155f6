pub mod challenges;
pub mod species;
pub mod user;

use askama::Template;
use axum::{
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::{self, AuthUser, OptionalAuth};
use crate::db::try_lock;
use crate::error::{AppError, StorageContext};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub signed_in: bool,
  pub species_count: i64,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
  pub username: String,
}

/// GET / - Species map, works signed in or out
pub async fn index(
  State(state): State<AppState>,
  OptionalAuth(auth): OptionalAuth,
) -> Result<Html<String>, AppError> {
  let species_count = {
    let conn = try_lock(&state.db)?;
    crate::db::species::species_count(&conn).storage("count species")?
  };

  let template = IndexTemplate {
    signed_in: auth.is_some(),
    species_count,
  };
  Ok(Html(template.render().unwrap_or_default()))
}

/// GET /profile - Observation map and challenge standings
pub async fn profile(State(state): State<AppState>, auth: AuthUser) -> Result<Response, AppError> {
  let user = {
    let conn = try_lock(&state.db)?;
    auth::db::get_user_by_id(&conn, auth.user_id).storage("select user")?
  };

  // Session outlived its user
  let Some(user) = user else {
    return Ok(Redirect::to(auth::middleware::LOGIN_PATH).into_response());
  };

  let template = ProfileTemplate {
    username: user.username,
  };
  Ok(Html(template.render().unwrap_or_default()).into_response())
}

/// Fallback for unknown paths
pub async fn not_found() -> AppError {
  AppError::NotFound("Resource")
}

pub use challenges::{
  create_challenge, invitations, invite_user, respond_to_invitation, user_challenges,
};
pub use species::{species_batch, species_geojson, species_images, species_info, species_list};
pub use user::{new_observation, user_info, user_observations};
