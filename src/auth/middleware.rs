//! Session gate for protected routes, plus the extractors handlers use to read
//! the authenticated user.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::db as auth_db;
use super::session::SESSION_COOKIE_NAME;
use crate::db::{try_lock, LogOnError};
use crate::error::{AppError, StorageContext};
use crate::state::AppState;

/// Where unauthenticated requests are sent
pub const LOGIN_PATH: &str = "/login";

/// Identity attached to a request once its session checks out.
///
/// Add this as a handler parameter on routes behind [`require_session`].
/// Without the gate in front it redirects to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Resolve the `sid` cookie to a user ID.
///
/// A missing cookie, unknown token and expired session all give `None`.
pub fn resolve_session(state: &AppState, jar: &CookieJar) -> Result<Option<i64>, AppError> {
    let Some(cookie) = jar.get(SESSION_COOKIE_NAME) else {
        return Ok(None);
    };
    if cookie.value().is_empty() {
        return Ok(None);
    }

    let conn = try_lock(&state.db)?;
    auth_db::verify_session(&conn, cookie.value()).storage("select session")
}

/// Middleware for the protected route group.
///
/// Attaches [`AuthUser`] and continues when the session is valid, otherwise
/// redirects to `/login` and the handler never runs.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match resolve_session(&state, &jar)? {
        Some(user_id) => {
            request.extensions_mut().insert(AuthUser { user_id });
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("No valid session for {}, redirecting", request.uri().path());
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| Redirect::to(LOGIN_PATH).into_response())
    }
}

/// Optional authentication extractor.
/// Returns Some(AuthUser) if the request carries a valid session, None otherwise.
/// Use for pages that work both with and without authentication.
pub struct OptionalAuth(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(OptionalAuth(Some(*user)));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let user = resolve_session(state, &jar)
            .log_warn("Session lookup failed")
            .flatten()
            .map(|user_id| AuthUser { user_id });
        Ok(OptionalAuth(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session;
    use axum::http::{header, HeaderMap, HeaderValue};
    use chrono::Duration;

    fn state_with_user() -> (AppState, i64) {
        let state = AppState::for_tests();
        let user_id = {
            let conn = state.db.lock().unwrap();
            auth_db::create_user(&conn, "alice", "a@x.com", "s:h").unwrap()
        };
        (state, user_id)
    }

    fn jar_with(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_resolve_valid_session() {
        let (state, alice) = state_with_user();
        let token = {
            let conn = state.db.lock().unwrap();
            create_session(&conn, alice, Duration::minutes(45)).unwrap()
        };

        let jar = jar_with(&format!("theme=dark; sid={}", token));
        assert_eq!(resolve_session(&state, &jar).unwrap(), Some(alice));
    }

    #[test]
    fn test_resolve_percent_encoded_value() {
        let (state, alice) = state_with_user();
        {
            let conn = state.db.lock().unwrap();
            auth_db::insert_session(&conn, "a b/c", alice, Duration::minutes(45)).unwrap();
        }

        let jar = jar_with("sid=a%20b%2Fc");
        assert_eq!(resolve_session(&state, &jar).unwrap(), Some(alice));
    }

    #[test]
    fn test_resolve_missing_or_garbage() {
        let (state, _) = state_with_user();
        assert_eq!(resolve_session(&state, &CookieJar::new()).unwrap(), None);
        assert_eq!(resolve_session(&state, &jar_with("sid=garbage")).unwrap(), None);
        assert_eq!(resolve_session(&state, &jar_with("sid=")).unwrap(), None);
        assert_eq!(resolve_session(&state, &jar_with("other=1")).unwrap(), None);
    }

    #[test]
    fn test_resolve_expired_session() {
        let (state, alice) = state_with_user();
        {
            let conn = state.db.lock().unwrap();
            auth_db::insert_session(&conn, "stale", alice, Duration::seconds(-1)).unwrap();
        }
        assert_eq!(resolve_session(&state, &jar_with("sid=stale")).unwrap(), None);
    }
}
