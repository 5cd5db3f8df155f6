//! Challenge storage: challenges, participants, invitations and standings.
//!
//! Multi-step writes (create + enrol creator, accept invitation) run inside a
//! single transaction so they either fully apply or leave no trace.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::{is_constraint_violation, parse_timestamp, timestamp};
use crate::auth::db as auth_db;
use crate::domain::{Challenge, ChallengeStandings, Invitation, ParticipantScore, PointsTable};

/// Result of [`create_challenge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
  Created,
  NameTaken,
}

/// Result of [`invite_user`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteOutcome {
  Invited,
  /// Inviter does not take part in the challenge (or it does not exist)
  NotParticipant,
  ChallengeEnded,
  UnknownInvitee,
  AlreadyParticipant,
  AlreadyInvited,
}

/// Result of [`respond_to_invitation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondOutcome {
  Answered,
  NoInvitation,
  /// Accepting is refused once the challenge is over
  ChallengeEnded,
}

const CHALLENGE_COLUMNS: &str =
  "name, start_date, end_date, lc_points, nt_points, vu_points, en_points, cr_points";

fn row_to_challenge(row: &Row) -> Result<Challenge> {
  let start: String = row.get(1)?;
  let end: String = row.get(2)?;
  Ok(Challenge {
    name: row.get(0)?,
    start_date: parse_timestamp(1, &start)?,
    end_date: parse_timestamp(2, &end)?,
    points: PointsTable {
      lc: row.get(3)?,
      nt: row.get(4)?,
      vu: row.get(5)?,
      en: row.get(6)?,
      cr: row.get(7)?,
    },
  })
}

/// Create a challenge with its creator as first participant, atomically.
pub fn create_challenge(conn: &Connection, challenge: &Challenge, creator_id: i64) -> Result<CreateOutcome> {
  let tx = conn.unchecked_transaction()?;

  let inserted = tx.execute(
    &format!(
      "INSERT INTO challenge ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      CHALLENGE_COLUMNS
    ),
    params![
      challenge.name,
      timestamp(challenge.start_date),
      timestamp(challenge.end_date),
      challenge.points.lc,
      challenge.points.nt,
      challenge.points.vu,
      challenge.points.en,
      challenge.points.cr,
    ],
  );
  match inserted {
    Ok(_) => {}
    Err(e) if is_constraint_violation(&e) => return Ok(CreateOutcome::NameTaken),
    Err(e) => return Err(e),
  }

  add_participant(&tx, &challenge.name, creator_id)?;
  tx.commit()?;
  Ok(CreateOutcome::Created)
}

pub fn add_participant(conn: &Connection, challenge_name: &str, user_id: i64) -> Result<()> {
  conn.execute(
    "INSERT INTO challenge_participants (challenge_name, user_id) VALUES (?1, ?2)",
    params![challenge_name, user_id],
  )?;
  Ok(())
}

pub fn is_participant(conn: &Connection, challenge_name: &str, user_id: i64) -> Result<bool> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM challenge_participants WHERE challenge_name = ?1 AND user_id = ?2",
    params![challenge_name, user_id],
    |row| row.get(0),
  )?;
  Ok(count > 0)
}

pub fn get_challenge(conn: &Connection, name: &str) -> Result<Option<Challenge>> {
  conn
    .query_row(
      &format!("SELECT {} FROM challenge WHERE name = ?1", CHALLENGE_COLUMNS),
      params![name],
      row_to_challenge,
    )
    .optional()
}

/// Invite `invitee_username` to a challenge on behalf of `inviter_id`
pub fn invite_user(
  conn: &Connection,
  challenge_name: &str,
  inviter_id: i64,
  invitee_username: &str,
  now: DateTime<Utc>,
) -> Result<InviteOutcome> {
  if !is_participant(conn, challenge_name, inviter_id)? {
    return Ok(InviteOutcome::NotParticipant);
  }
  let Some(challenge) = get_challenge(conn, challenge_name)? else {
    return Ok(InviteOutcome::NotParticipant);
  };
  if challenge.has_ended(now) {
    return Ok(InviteOutcome::ChallengeEnded);
  }

  let Some(invitee_id) = auth_db::get_user_id_by_username(conn, invitee_username)? else {
    return Ok(InviteOutcome::UnknownInvitee);
  };
  if is_participant(conn, challenge_name, invitee_id)? {
    return Ok(InviteOutcome::AlreadyParticipant);
  }

  let inserted = conn.execute(
    r#"
    INSERT INTO challenge_invitations (challenge_name, user_id, invited_by, created_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
    params![challenge_name, invitee_id, inviter_id, timestamp(now)],
  );
  match inserted {
    Ok(_) => Ok(InviteOutcome::Invited),
    Err(e) if is_constraint_violation(&e) => Ok(InviteOutcome::AlreadyInvited),
    Err(e) => Err(e),
  }
}

/// Invitations waiting for the user's answer, newest first
pub fn pending_invitations(conn: &Connection, user_id: i64) -> Result<Vec<Invitation>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT c.name, c.start_date, c.end_date, u.username
    FROM challenge_invitations i
    JOIN challenge c ON c.name = i.challenge_name
    JOIN users u ON u.id = i.invited_by
    WHERE i.user_id = ?1
    ORDER BY i.created_at DESC, c.name
    "#,
  )?;
  let invitations = stmt
    .query_map(params![user_id], |row| {
      let start: String = row.get(1)?;
      let end: String = row.get(2)?;
      Ok(Invitation {
        challenge_name: row.get(0)?,
        start_date: parse_timestamp(1, &start)?,
        end_date: parse_timestamp(2, &end)?,
        invited_by: row.get(3)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(invitations)
}

/// Accept or decline an invitation.
///
/// A declined invitation is always removed. An accepted one is kept when the
/// challenge has already ended.
pub fn respond_to_invitation(
  conn: &Connection,
  challenge_name: &str,
  user_id: i64,
  accept: bool,
  now: DateTime<Utc>,
) -> Result<RespondOutcome> {
  let tx = conn.unchecked_transaction()?;

  if accept {
    let ended = get_challenge(&tx, challenge_name)?.is_some_and(|c| c.has_ended(now));
    if ended {
      return Ok(RespondOutcome::ChallengeEnded);
    }
  }

  let removed = tx.execute(
    "DELETE FROM challenge_invitations WHERE challenge_name = ?1 AND user_id = ?2",
    params![challenge_name, user_id],
  )?;
  if removed == 0 {
    return Ok(RespondOutcome::NoInvitation);
  }
  if accept {
    add_participant(&tx, challenge_name, user_id)?;
  }

  tx.commit()?;
  Ok(RespondOutcome::Answered)
}

/// Challenges the user takes part in, by start date
pub fn get_user_challenges(conn: &Connection, user_id: i64) -> Result<Vec<Challenge>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT c.name, c.start_date, c.end_date, c.lc_points, c.nt_points, c.vu_points, c.en_points, c.cr_points
    FROM challenge c
    JOIN challenge_participants cp ON c.name = cp.challenge_name
    WHERE cp.user_id = ?1
    ORDER BY c.start_date, c.name
    "#,
  )?;
  let challenges = stmt
    .query_map(params![user_id], row_to_challenge)?
    .collect::<Result<Vec<_>>>()?;
  Ok(challenges)
}

/// Participants of a challenge with their scores, best first
pub fn get_participant_scores(conn: &Connection, challenge_name: &str) -> Result<Vec<ParticipantScore>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT username, lc_score, nt_score, vu_score, en_score, cr_score,
           (lc_score + nt_score + vu_score + en_score + cr_score) AS total_points
    FROM user_challenge_points
    WHERE challenge_name = ?1
    ORDER BY total_points DESC, username
    "#,
  )?;
  let scores = stmt
    .query_map(params![challenge_name], |row| {
      Ok(ParticipantScore {
        username: row.get(0)?,
        lc_score: row.get(1)?,
        nt_score: row.get(2)?,
        vu_score: row.get(3)?,
        en_score: row.get(4)?,
        cr_score: row.get(5)?,
        score: row.get(6)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(scores)
}

/// Every challenge of the user together with current standings
pub fn get_user_challenges_with_participants(
  conn: &Connection,
  user_id: i64,
  now: DateTime<Utc>,
) -> Result<Vec<ChallengeStandings>> {
  get_user_challenges(conn, user_id)?
    .into_iter()
    .map(|challenge| {
      let participants = get_participant_scores(conn, &challenge.name)?;
      Ok(ChallengeStandings::new(challenge, participants, now))
    })
    .collect()
}
