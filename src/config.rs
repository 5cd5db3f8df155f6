//! Application configuration.
//!
//! Every value is resolved with priority: config.toml > environment (.env is
//! loaded first) > default.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::auth::session::DEFAULT_SESSION_TTL_MINUTES;
use crate::paths;

// ==================== File Format ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<ServerSection>,
    database: Option<DatabaseSection>,
    session: Option<SessionSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    bind_addr: Option<String>,
    port: Option<u16>,
    static_dir: Option<String>,
    secure_cookies: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
    species_catalog: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionSection {
    ttl_minutes: Option<i64>,
}

// ==================== Resolved Configuration ====================

/// Server address to bind to
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// Server port
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub static_dir: PathBuf,
    pub species_catalog: PathBuf,
    pub session_ttl_minutes: i64,
    /// Add `Secure` to the session cookie (enable behind HTTPS)
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            database_path: paths::db_path(Path::new(paths::DEFAULT_DATA_DIR)),
            static_dir: PathBuf::from(paths::STATIC_DIR),
            species_catalog: PathBuf::from(paths::SPECIES_CATALOG),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            secure_cookies: false,
        }
    }
}

impl Config {
    /// Load from `.env`, the process environment and `config.toml`
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file = std::fs::read_to_string(paths::CONFIG_FILE).ok();
        let config = Self::from_sources(file.as_deref(), |key| std::env::var(key).ok());
        tracing::info!(
            "Config: bind {}, database {}, session TTL {} min",
            config.bind_address(),
            config.database_path.display(),
            config.session_ttl_minutes
        );
        config
    }

    /// Resolve configuration from config file contents and an environment lookup
    pub fn from_sources(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = file.map(parse_file).unwrap_or_default();
        let server = file.server.unwrap_or_default();
        let database = file.database.unwrap_or_default();
        let session = file.session.unwrap_or_default();
        let defaults = Config::default();

        let data_dir = env("DATA_DIR").unwrap_or_else(|| paths::DEFAULT_DATA_DIR.to_string());

        let session_ttl_minutes = session
            .ttl_minutes
            .or_else(|| parse_env(&env, "SESSION_TTL_MINUTES"))
            .filter(|minutes| {
                let ok = *minutes > 0;
                if !ok {
                    tracing::warn!("Ignoring non-positive session TTL {}", minutes);
                }
                ok
            })
            .unwrap_or(defaults.session_ttl_minutes);

        Self {
            bind_addr: server
                .bind_addr
                .or_else(|| env("BIND_ADDR"))
                .unwrap_or(defaults.bind_addr),
            port: server
                .port
                .or_else(|| parse_env(&env, "PORT"))
                .unwrap_or(defaults.port),
            database_path: database
                .path
                .or_else(|| env("DATABASE_PATH"))
                .map(PathBuf::from)
                .unwrap_or_else(|| paths::db_path(Path::new(&data_dir))),
            static_dir: server
                .static_dir
                .or_else(|| env("STATIC_DIR"))
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            species_catalog: database
                .species_catalog
                .or_else(|| env("SPECIES_CATALOG"))
                .map(PathBuf::from)
                .unwrap_or(defaults.species_catalog),
            session_ttl_minutes,
            secure_cookies: server
                .secure_cookies
                .or_else(|| parse_env(&env, "SECURE_COOKIES"))
                .unwrap_or(defaults.secure_cookies),
        }
    }

    /// Get the full server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }
}

fn parse_file(contents: &str) -> FileConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable {}: {}", paths::CONFIG_FILE, e);
        FileConfig::default()
    })
}

fn parse_env<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={}", key, raw);
            None
        }
    }
}
