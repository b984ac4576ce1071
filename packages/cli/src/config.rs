//! TOML configuration for the property map CLI.
//!
//! Every external source the filter consumes is named here explicitly —
//! store path, area-of-interest polygon, transit stations, notes file —
//! with sensible defaults under `data/`. An optional source whose file is
//! absent simply stays unconfigured; nothing is inferred from file
//! presence elsewhere.

use std::path::{Path, PathBuf};

use property_map_database::paths;
use serde::Deserialize;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "property-map.toml";

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// TOML parse error.
    #[error("Config parse error in {path}: {source}")]
    Parse {
        /// Path that caused the error.
        path: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },
}

/// Map viewport section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapSection {
    /// Viewport center as `[latitude, longitude]`.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            center: [45.5037, -73.6254],
            zoom: 14,
        }
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Listings store path. Defaults to `data/listings.duckdb`.
    pub db_path: Option<PathBuf>,
    /// Area-of-interest `GeoJSON` path. Defaults to
    /// `data/area_of_interest.geojson`.
    pub area_of_interest: Option<PathBuf>,
    /// Transit stations `GeoJSON` path. Defaults to
    /// `data/stations.geojson`.
    pub stations: Option<PathBuf>,
    /// Notes file path. Defaults to `data/notes.txt`.
    pub notes: Option<PathBuf>,
    /// Dataset archive URL for `ingest`.
    pub dataset_url: Option<String>,
    /// Map viewport settings.
    pub map: MapSection,
}

impl AppConfig {
    /// Loads configuration from an explicit path, or from
    /// [`DEFAULT_CONFIG_FILE`] when present, or defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit path cannot be read, or if
    /// any config file fails to parse. A missing default file is not an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    log::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Listings store path after defaulting.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(paths::listings_db_path)
    }

    /// Area-of-interest path after defaulting.
    #[must_use]
    pub fn area_of_interest_path(&self) -> PathBuf {
        self.area_of_interest
            .clone()
            .unwrap_or_else(paths::area_of_interest_path)
    }

    /// Stations path after defaulting.
    #[must_use]
    pub fn stations_path(&self) -> PathBuf {
        self.stations.clone().unwrap_or_else(paths::stations_path)
    }

    /// Notes path after defaulting.
    #[must_use]
    pub fn notes_path(&self) -> PathBuf {
        self.notes.clone().unwrap_or_else(paths::notes_path)
    }

    /// Dataset URL after defaulting.
    #[must_use]
    pub fn dataset_url(&self) -> String {
        self.dataset_url
            .clone()
            .unwrap_or_else(|| property_map_ingest::DEFAULT_DATASET_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            db_path = "other/listings.duckdb"
            dataset_url = "https://example.com/listings.tar.zst"

            [map]
            center = [45.0, -73.0]
            zoom = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path(), PathBuf::from("other/listings.duckdb"));
        assert_eq!(config.dataset_url(), "https://example.com/listings.tar.zst");
        assert_eq!(config.map.center, [45.0, -73.0]);
        assert_eq!(config.map.zoom, 12);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.db_path().ends_with("data/listings.duckdb"));
        assert!(config.notes_path().ends_with("data/notes.txt"));
        assert_eq!(config.map.zoom, 14);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("no_such_key = true\n");
        assert!(result.is_err());
    }
}
