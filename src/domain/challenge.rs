use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Points awarded per observation, by conservation status.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointsTable {
  pub lc: f64,
  pub nt: f64,
  pub vu: f64,
  pub en: f64,
  pub cr: f64,
}

impl PointsTable {
  pub fn is_valid(&self) -> bool {
    [self.lc, self.nt, self.vu, self.en, self.cr]
      .iter()
      .all(|p| p.is_finite() && *p >= 0.0)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
  pub name: String,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub points: PointsTable,
}

impl Challenge {
  pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
    now > self.end_date
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantScore {
  pub username: String,
  pub score: f64,
  pub lc_score: f64,
  pub nt_score: f64,
  pub vu_score: f64,
  pub en_score: f64,
  pub cr_score: f64,
}

/// A challenge together with its current standings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStandings {
  pub challenge_name: String,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub ended: bool,
  pub lc_points: f64,
  pub nt_points: f64,
  pub vu_points: f64,
  pub en_points: f64,
  pub cr_points: f64,
  pub participants: Vec<ParticipantScore>,
}

impl ChallengeStandings {
  pub fn new(challenge: Challenge, participants: Vec<ParticipantScore>, now: DateTime<Utc>) -> Self {
    let ended = challenge.has_ended(now);
    let Challenge {
      name,
      start_date,
      end_date,
      points,
    } = challenge;
    Self {
      challenge_name: name,
      start_date,
      end_date,
      ended,
      lc_points: points.lc,
      nt_points: points.nt,
      vu_points: points.vu,
      en_points: points.en,
      cr_points: points.cr,
      participants,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
  pub challenge_name: String,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub invited_by: String,
}
