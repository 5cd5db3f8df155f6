//! Project path defaults - single source of truth for file locations.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! This allows running isolated server instances side by side:
//! ```bash
//! DATA_DIR=data/test PORT=3001 cargo run
//! ```

use std::path::{Path, PathBuf};

/// Base data directory when `DATA_DIR` is unset
pub const DEFAULT_DATA_DIR: &str = "data";

/// SQLite file name inside the data directory
pub const DB_FILE_NAME: &str = "birdspot.db";

/// Optional configuration file, relative to the working directory
pub const CONFIG_FILE: &str = "config.toml";

/// Static assets served under `/static`
pub const STATIC_DIR: &str = "static";

/// Species catalog loaded into an empty database
pub const SPECIES_CATALOG: &str = "seed/species.json";

/// SQLite database path inside `data_dir`
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path() {
        assert_eq!(
            db_path(Path::new(DEFAULT_DATA_DIR)),
            PathBuf::from("data/birdspot.db")
        );
        assert_eq!(
            db_path(Path::new("/srv/birds")),
            PathBuf::from("/srv/birds/birdspot.db")
        );
    }
}
