use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use super::{parse_timestamp, timestamp};
use crate::domain::Observation;

/// Record a sighting, returns the observation ID.
///
/// `scientific_name` must already be a catalog key (see
/// [`super::species::resolve_scientific_name`]).
pub fn insert_observation(
  conn: &Connection,
  user_id: i64,
  scientific_name: &str,
  latitude: f64,
  longitude: f64,
  observed_at: DateTime<Utc>,
) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO observations (user_id, species_scientific_name, latitude, longitude, observed_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
    params![user_id, scientific_name, latitude, longitude, timestamp(observed_at)],
  )?;
  Ok(conn.last_insert_rowid())
}

/// All observations made by a user, oldest first
pub fn get_user_observations(conn: &Connection, user_id: i64) -> Result<Vec<Observation>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT species_scientific_name, latitude, longitude, observed_at, approved
    FROM observations
    WHERE user_id = ?1
    ORDER BY observed_at, id
    "#,
  )?;
  let observations = stmt
    .query_map(params![user_id], |row| {
      let observed_at: String = row.get(3)?;
      Ok(Observation {
        species_scientific_name: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        observed_at: parse_timestamp(3, &observed_at)?,
        approved: row.get::<_, i64>(4)? == 1,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(observations)
}
