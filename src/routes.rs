use axum::{middleware, routing::get, routing::post, Router};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::auth;
use crate::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// Everything under `protected` sits behind the session gate; a request
/// without a valid `sid` cookie is redirected to `/login` before any handler
/// runs.
pub fn router(state: AppState, static_dir: &Path) -> Router {
  let protected = Router::new()
    .route("/profile", get(handlers::profile))
    .route("/api/user", post(handlers::user_info))
    .route("/api/user/observations", post(handlers::user_observations))
    .route("/api/user/observations/new", post(handlers::new_observation))
    .route("/api/user/challenges", post(handlers::user_challenges))
    .route("/api/user/challenges/new", post(handlers::create_challenge))
    .route("/api/user/challenges/invite", post(handlers::invite_user))
    .route("/api/user/challenges/invitations", post(handlers::invitations))
    .route("/api/user/challenges/invite/respond", post(handlers::respond_to_invitation))
    .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session));

  Router::new()
    .route("/", get(handlers::index))
    .route("/login", get(auth::login_page))
    .route("/register", get(auth::register_page))
    .route("/api/login", post(auth::login_submit))
    .route("/api/register", post(auth::register_submit))
    .route("/api/logout", post(auth::logout))
    .route("/api/species", get(handlers::species_list))
    .route("/api/species/batch", get(handlers::species_batch))
    .route("/api/species/info", post(handlers::species_info))
    .route("/api/species/geojson", post(handlers::species_geojson))
    .route("/api/species/images", post(handlers::species_images))
    .merge(protected)
    .nest_service("/static", ServeDir::new(static_dir))
    .fallback(handlers::not_found)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
