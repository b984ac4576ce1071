#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the local data directory.
//!
//! All paths are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the path for the listings `DuckDB` file.
#[must_use]
pub fn listings_db_path() -> PathBuf {
    data_dir().join("listings.duckdb")
}

/// Returns the path for the area-of-interest polygon `GeoJSON` file.
#[must_use]
pub fn area_of_interest_path() -> PathBuf {
    data_dir().join("area_of_interest.geojson")
}

/// Returns the path for the transit stations `GeoJSON` file.
#[must_use]
pub fn stations_path() -> PathBuf {
    data_dir().join("stations.geojson")
}

/// Returns the path for the per-MLS notes file.
#[must_use]
pub fn notes_path() -> PathBuf {
    data_dir().join("notes.txt")
}

/// Returns the `data/generated/` directory for output artifacts.
#[must_use]
pub fn generated_dir() -> PathBuf {
    data_dir().join("generated")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
