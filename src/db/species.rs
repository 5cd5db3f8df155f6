//! Species catalog queries: species, seasonal ranges and media.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::contains_pattern;
use crate::domain::{ConservationStatus, Feature, RangeProperties, Species, SpeciesImage};

/// Upper bound for a single catalog page
pub const MAX_BATCH_LIMIT: i64 = 200;

const SPECIES_COLUMNS: &str =
  "scientific_name, common_name, family, order_name, diet, conservation_status";

fn row_to_species(row: &Row) -> Result<Species> {
  Ok(Species {
    scientific_name: row.get(0)?,
    common_name: row.get(1)?,
    family: row.get(2)?,
    order_name: row.get(3)?,
    diet: row.get(4)?,
    conservation_status: row.get(5)?,
  })
}

/// Every species, ordered by scientific name
pub fn list_species(conn: &Connection) -> Result<Vec<Species>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM species ORDER BY scientific_name",
    SPECIES_COLUMNS
  ))?;
  let species = stmt
    .query_map([], row_to_species)?
    .collect::<Result<Vec<_>>>()?;
  Ok(species)
}

/// First species whose scientific or common name contains `term`
pub fn find_species(conn: &Connection, term: &str) -> Result<Option<Species>> {
  conn
    .query_row(
      &format!(
        r#"
        SELECT {}
        FROM species
        WHERE LOWER(scientific_name) LIKE ?1 ESCAPE '\'
           OR LOWER(common_name) LIKE ?1 ESCAPE '\'
        ORDER BY scientific_name
        LIMIT 1
        "#,
        SPECIES_COLUMNS
      ),
      params![contains_pattern(term)],
      row_to_species,
    )
    .optional()
}

/// Resolve an exact scientific or common name (case-insensitive) to the
/// scientific name used as the species key.
pub fn resolve_scientific_name(conn: &Connection, name: &str) -> Result<Option<String>> {
  conn
    .query_row(
      r#"
      SELECT scientific_name FROM species
      WHERE LOWER(scientific_name) = LOWER(?1) OR LOWER(common_name) = LOWER(?1)
      ORDER BY scientific_name
      LIMIT 1
      "#,
      params![name.trim()],
      |row| row.get(0),
    )
    .optional()
}

/// Range features for species matching `term` in the given season
pub fn species_ranges(
  conn: &Connection,
  term: &str,
  season: &str,
) -> Result<Vec<Feature<RangeProperties>>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT r.geom, r.species_scientific_name, r.season
    FROM species_range r
    JOIN species s ON r.species_scientific_name = s.scientific_name
    WHERE (LOWER(r.species_scientific_name) LIKE ?1 ESCAPE '\'
           OR LOWER(s.common_name) LIKE ?1 ESCAPE '\')
      AND LOWER(r.season) = LOWER(?2)
    ORDER BY r.species_scientific_name, r.id
    "#,
  )?;

  let features = stmt
    .query_map(params![contains_pattern(term), season], |row| {
      let raw: String = row.get(0)?;
      let geometry: Value = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
      Ok(Feature::new(
        RangeProperties {
          species_scientific_name: row.get(1)?,
          season: row.get(2)?,
        },
        geometry,
      ))
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(features)
}

/// Images for the species whose scientific or common name is exactly `name`
pub fn species_images(conn: &Connection, name: &str) -> Result<Vec<SpeciesImage>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT m.url, m.license, m.contributor
    FROM media m
    JOIN species s ON m.species_scientific_name = s.scientific_name
    WHERE (s.scientific_name = ?1 OR s.common_name = ?1) AND m.media_type = 'image'
    ORDER BY m.id
    "#,
  )?;
  let images = stmt
    .query_map(params![name], |row| {
      Ok(SpeciesImage {
        url: row.get(0)?,
        license: row.get(1)?,
        contributor: row.get(2)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(images)
}

/// One page of the catalog, keyed on scientific name.
///
/// `after` is the scientific name of the last species of the previous page;
/// empty means start from the beginning.
pub fn species_batch(conn: &Connection, limit: i64, after: &str) -> Result<Vec<Species>> {
  let limit = limit.clamp(1, MAX_BATCH_LIMIT);
  let mut stmt = conn.prepare(&format!(
    r#"
    SELECT {}
    FROM species
    WHERE ?1 = '' OR LOWER(scientific_name) > LOWER(?1)
    ORDER BY LOWER(scientific_name)
    LIMIT ?2
    "#,
    SPECIES_COLUMNS
  ))?;
  let species = stmt
    .query_map(params![after, limit], row_to_species)?
    .collect::<Result<Vec<_>>>()?;
  Ok(species)
}

pub fn species_count(conn: &Connection) -> Result<i64> {
  conn.query_row("SELECT COUNT(*) FROM species", [], |row| row.get(0))
}

pub fn insert_species(conn: &Connection, species: &Species) -> Result<()> {
  let status = species
    .conservation_status
    .as_deref()
    .map(ConservationStatus::normalize);
  conn.execute(
    r#"
    INSERT INTO species (scientific_name, common_name, family, order_name, diet, conservation_status)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
    params![
      species.scientific_name,
      species.common_name,
      species.family,
      species.order_name,
      species.diet,
      status,
    ],
  )?;
  Ok(())
}

pub fn insert_range(conn: &Connection, scientific_name: &str, season: &str, geometry: &Value) -> Result<()> {
  conn.execute(
    "INSERT INTO species_range (species_scientific_name, season, geom) VALUES (?1, ?2, ?3)",
    params![scientific_name, season, geometry.to_string()],
  )?;
  Ok(())
}

pub fn insert_media(conn: &Connection, media: &CatalogMedia) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO media (species_scientific_name, media_type, url, license, contributor)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
    params![
      media.species_scientific_name,
      media.media_type,
      media.url,
      media.license,
      media.contributor,
    ],
  )?;
  Ok(())
}

// ==================== Catalog Import ====================

/// On-disk catalog file layout
#[derive(Debug, Deserialize)]
pub struct Catalog {
  #[serde(default)]
  pub species: Vec<Species>,
  #[serde(default)]
  pub ranges: Vec<CatalogRange>,
  #[serde(default)]
  pub media: Vec<CatalogMedia>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogRange {
  pub species_scientific_name: String,
  pub season: String,
  pub geometry: Value,
}

#[derive(Debug, Deserialize)]
pub struct CatalogMedia {
  pub species_scientific_name: String,
  #[serde(default = "default_media_type")]
  pub media_type: String,
  pub url: String,
  #[serde(default)]
  pub license: Option<String>,
  #[serde(default)]
  pub contributor: Option<String>,
}

fn default_media_type() -> String {
  "image".to_string()
}

/// Load a parsed catalog in a single transaction
pub fn import_catalog(conn: &Connection, catalog: &Catalog) -> Result<usize> {
  let tx = conn.unchecked_transaction()?;
  for species in &catalog.species {
    insert_species(&tx, species)?;
  }
  for range in &catalog.ranges {
    insert_range(&tx, &range.species_scientific_name, &range.season, &range.geometry)?;
  }
  for media in &catalog.media {
    insert_media(&tx, media)?;
  }
  tx.commit()?;
  Ok(catalog.species.len())
}

/// Seed the catalog from `path` if the species table is empty (idempotent).
///
/// A missing file is not an error: the catalog can be loaded later.
pub fn seed_catalog(conn: &Connection, path: &Path) -> std::result::Result<usize, SeedError> {
  if species_count(conn)? > 0 {
    return Ok(0);
  }
  if !path.exists() {
    tracing::info!("No species catalog at {}, skipping seed", path.display());
    return Ok(0);
  }

  let contents = std::fs::read_to_string(path)?;
  let catalog: Catalog = serde_json::from_str(&contents)?;
  let count = import_catalog(conn, &catalog)?;
  tracing::info!("Seeded {} species from {}", count, path.display());
  Ok(count)
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
  #[error("failed to read catalog: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to parse catalog: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("failed to store catalog: {0}")]
  Db(#[from] rusqlite::Error),
}
