//! Challenge endpoints: creation, invitations and standings.

use axum::{
  extract::{rejection::JsonRejection, State},
  http::StatusCode,
  Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::db::challenges::{self as challenge_db, CreateOutcome, InviteOutcome, RespondOutcome};
use crate::db::try_lock;
use crate::domain::{Challenge, ChallengeStandings, Invitation, PointsTable};
use crate::error::{AppError, StorageContext};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChallenge {
  pub name: String,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub points: PointsTable,
}

#[derive(Deserialize)]
pub struct InviteRequest {
  pub challenge: String,
  pub username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
  pub challenge_name: String,
  /// true accepts, false declines
  pub response: bool,
}

fn success() -> Json<Value> {
  Json(json!({ "success": true }))
}

/// Check a new challenge before it reaches storage
fn validate_challenge(req: NewChallenge, now: DateTime<Utc>) -> Result<Challenge, AppError> {
  let name = req.name.trim();
  if name.is_empty() {
    return Err(AppError::MalformedInput("Challenge name is required".to_string()));
  }
  if req.start_date >= req.end_date {
    return Err(AppError::MalformedInput("Start date must be before end date".to_string()));
  }
  if req.end_date <= now {
    return Err(AppError::MalformedInput("End date must be in the future".to_string()));
  }
  if !req.points.is_valid() {
    return Err(AppError::MalformedInput(
      "Points must be non-negative numbers".to_string(),
    ));
  }

  Ok(Challenge {
    name: name.to_string(),
    start_date: req.start_date,
    end_date: req.end_date,
    points: req.points,
  })
}

/// POST /api/user/challenges - Standings for every challenge the user is in
pub async fn user_challenges(
  State(state): State<AppState>,
  auth: AuthUser,
) -> Result<Json<Vec<ChallengeStandings>>, AppError> {
  let conn = try_lock(&state.db)?;
  let standings = challenge_db::get_user_challenges_with_participants(&conn, auth.user_id, Utc::now())
    .storage("select challenge standings")?;
  Ok(Json(standings))
}

/// POST /api/user/challenges/new
pub async fn create_challenge(
  State(state): State<AppState>,
  auth: AuthUser,
  body: Result<Json<NewChallenge>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
  let Json(req) = body?;
  let challenge = validate_challenge(req, Utc::now())?;

  let conn = try_lock(&state.db)?;
  match challenge_db::create_challenge(&conn, &challenge, auth.user_id).storage("insert challenge")? {
    CreateOutcome::Created => {
      tracing::info!("User {} created challenge {}", auth.user_id, challenge.name);
      Ok((StatusCode::CREATED, success()))
    }
    CreateOutcome::NameTaken => Err(AppError::Conflict("Challenge name already taken")),
  }
}

/// POST /api/user/challenges/invite
pub async fn invite_user(
  State(state): State<AppState>,
  auth: AuthUser,
  body: Result<Json<InviteRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
  let Json(req) = body?;

  let conn = try_lock(&state.db)?;
  let outcome = challenge_db::invite_user(
    &conn,
    req.challenge.trim(),
    auth.user_id,
    req.username.trim(),
    Utc::now(),
  )
  .storage("insert invitation")?;

  match outcome {
    InviteOutcome::Invited => Ok(success()),
    InviteOutcome::NotParticipant => Err(AppError::Forbidden),
    InviteOutcome::ChallengeEnded => Err(AppError::Conflict("Challenge has ended")),
    InviteOutcome::UnknownInvitee => Err(AppError::NotFound("User")),
    InviteOutcome::AlreadyParticipant => Err(AppError::Conflict("User already participates")),
    InviteOutcome::AlreadyInvited => Err(AppError::Conflict("User already invited")),
  }
}

/// POST /api/user/challenges/invitations
pub async fn invitations(
  State(state): State<AppState>,
  auth: AuthUser,
) -> Result<Json<Vec<Invitation>>, AppError> {
  let conn = try_lock(&state.db)?;
  let pending = challenge_db::pending_invitations(&conn, auth.user_id).storage("select invitations")?;
  Ok(Json(pending))
}

/// POST /api/user/challenges/invite/respond
pub async fn respond_to_invitation(
  State(state): State<AppState>,
  auth: AuthUser,
  body: Result<Json<InvitationResponse>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
  let Json(req) = body?;

  let conn = try_lock(&state.db)?;
  let outcome = challenge_db::respond_to_invitation(
    &conn,
    req.challenge_name.trim(),
    auth.user_id,
    req.response,
    Utc::now(),
  )
  .storage("answer invitation")?;

  match outcome {
    RespondOutcome::Answered => Ok(success()),
    RespondOutcome::NoInvitation => Err(AppError::NotFound("Invitation")),
    RespondOutcome::ChallengeEnded => Err(AppError::Conflict("Challenge has ended")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn request(name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> NewChallenge {
    NewChallenge {
      name: name.to_string(),
      start_date: start,
      end_date: end,
      points: PointsTable {
        lc: 1.0,
        nt: 2.0,
        vu: 3.0,
        en: 4.0,
        cr: 5.0,
      },
    }
  }

  #[test]
  fn test_valid_challenge_is_trimmed() {
    let now = Utc::now();
    let challenge = validate_challenge(request("  Spring  ", now, now + Duration::days(7)), now).unwrap();
    assert_eq!(challenge.name, "Spring");
  }

  #[test]
  fn test_rejects_bad_dates() {
    let now = Utc::now();
    // start after end
    assert!(validate_challenge(request("a", now + Duration::days(2), now + Duration::days(1)), now).is_err());
    // equal bounds
    assert!(validate_challenge(request("a", now + Duration::days(1), now + Duration::days(1)), now).is_err());
    // already over
    assert!(validate_challenge(request("a", now - Duration::days(7), now - Duration::days(1)), now).is_err());
  }

  #[test]
  fn test_rejects_blank_name_and_negative_points() {
    let now = Utc::now();
    assert!(validate_challenge(request("   ", now, now + Duration::days(1)), now).is_err());

    let mut req = request("a", now, now + Duration::days(1));
    req.points.vu = -1.0;
    assert!(matches!(validate_challenge(req, now), Err(AppError::MalformedInput(_))));
  }
}
