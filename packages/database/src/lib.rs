#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB` listings store for the property map.
//!
//! Owns the dataset schema (`listings`, `price_history`, `open_houses`),
//! canonical data paths, the typed predicate builder, and the query
//! functions that materialize [`property_map_listings_models::Listing`]
//! rows. Filtering opens the store read-only; only the maintenance entry
//! points ([`open`], [`backfill_computed`]) take a writable connection.
//!
//! Dates and timestamps are stored as ISO 8601 TEXT so that lexicographic
//! comparison in SQL matches chronological order.

pub mod paths;
pub mod predicates;
pub mod queries;
pub mod units;

use std::path::Path;

use duckdb::Connection;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Underlying `DuckDB` error.
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// The store file does not exist.
    #[error("Listings store not found at {0}")]
    StoreNotFound(String),

    /// I/O error while preparing the data directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Opens (or creates) the listings `DuckDB` and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent).map_err(|e| DbError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens an in-memory listings store with the schema applied.
///
/// Used by tests and ephemeral tooling; the on-disk store goes through
/// [`open`] / [`open_read_only`].
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens the listings store read-only for filtering.
///
/// The store is a hard requirement: a missing file is fatal, not a reason
/// to silently create an empty dataset.
///
/// # Errors
///
/// Returns [`DbError::StoreNotFound`] if the file does not exist, or
/// [`DbError::Database`] if the connection fails.
pub fn open_read_only(path: &Path) -> Result<Connection, DbError> {
    if !path.exists() {
        return Err(DbError::StoreNotFound(path.display().to_string()));
    }

    let config = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
    let conn = Connection::open_with_flags(path, config)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS listings (
            id BIGINT PRIMARY KEY,
            mls_number BIGINT NOT NULL UNIQUE,
            address TEXT,
            latitude DOUBLE,
            longitude DOUBLE,
            price BIGINT,
            parking TEXT,
            parking_spaces INTEGER,
            ownership_type TEXT,
            zoning_type TEXT,
            property_type TEXT,
            building_type TEXT,
            stories INTEGER,
            bedrooms INTEGER,
            bathrooms INTEGER,
            units_total INTEGER,
            new_build BOOLEAN,
            size_interior TEXT,
            computed_sqft DOUBLE,
            computed_price_per_sqft DOUBLE,
            last_updated TEXT,
            price_change_date TEXT,
            photo_url TEXT,
            details_url TEXT,
            postal_code TEXT,
            remarks TEXT
        );

        CREATE TABLE IF NOT EXISTS price_history (
            mls_number BIGINT NOT NULL,
            price BIGINT NOT NULL,
            recorded_at TEXT NOT NULL,
            PRIMARY KEY (mls_number, recorded_at)
        );

        CREATE TABLE IF NOT EXISTS open_houses (
            mls_number BIGINT NOT NULL,
            starts_at TEXT NOT NULL,
            PRIMARY KEY (mls_number, starts_at)
        );",
    )?;

    Ok(())
}

/// Result of a computed-column backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    /// Rows whose computed columns were filled in.
    pub updated: u64,
    /// Rows skipped because the size string could not be parsed.
    pub skipped: u64,
}

/// Fills in `computed_sqft` and `computed_price_per_sqft` for rows that
/// have a raw `size_interior` string but no computed values yet.
///
/// Unparseable size strings are counted and logged, never coerced to a
/// default. Rows with a non-positive parsed size are skipped the same way
/// so that price-per-sqft can never divide by zero.
///
/// # Errors
///
/// Returns [`DbError`] if any query or update fails.
pub fn backfill_computed(conn: &Connection) -> Result<BackfillStats, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, mls_number, price, size_interior
         FROM listings
         WHERE size_interior IS NOT NULL AND computed_sqft IS NULL
         ORDER BY id",
    )?;

    let mut pending: Vec<(i64, Option<i64>, f64)> = Vec::new();
    let mut stats = BackfillStats::default();

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        let mls_number: i64 = row.get(1)?;
        let price: Option<i64> = row.get(2)?;
        let size_interior: String = row.get(3)?;

        match units::to_sqft(&size_interior) {
            Ok(sqft) if sqft > 0.0 => pending.push((id, price, sqft)),
            Ok(_) => {
                log::warn!("listing {mls_number}: non-positive interior size {size_interior:?}");
                stats.skipped += 1;
            }
            Err(e) => {
                log::warn!("listing {mls_number}: {e}");
                stats.skipped += 1;
            }
        }
    }
    drop(rows);
    drop(stmt);

    let mut update = conn.prepare(
        "UPDATE listings
         SET computed_sqft = ?,
             computed_price_per_sqft = ?
         WHERE id = ?",
    )?;

    for (id, price, sqft) in pending {
        #[allow(clippy::cast_precision_loss)]
        let per_sqft = price.map(|p| p as f64 / sqft);
        update.execute(duckdb::params![sqft, per_sqft, id])?;
        stats.updated += 1;
    }

    log::info!(
        "computed-column backfill: {} updated, {} skipped",
        stats.updated,
        stats.skipped
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> Connection {
        open_in_memory().expect("in-memory store")
    }

    #[test]
    fn backfill_computes_sqft_and_price_per_sqft() {
        let conn = memory_store();
        conn.execute(
            "INSERT INTO listings (id, mls_number, price, size_interior)
             VALUES (1, 100, 500000, '1000 sqft')",
            [],
        )
        .unwrap();

        let stats = backfill_computed(&conn).unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped, 0);

        let (sqft, per_sqft): (f64, f64) = conn
            .query_row(
                "SELECT computed_sqft, computed_price_per_sqft FROM listings WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!((sqft - 1000.0).abs() < f64::EPSILON);
        assert!((per_sqft - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn backfill_skips_unparseable_sizes() {
        let conn = memory_store();
        conn.execute(
            "INSERT INTO listings (id, mls_number, price, size_interior)
             VALUES (1, 100, 500000, '100 cubits')",
            [],
        )
        .unwrap();

        let stats = backfill_computed(&conn).unwrap();
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.skipped, 1);

        let sqft: Option<f64> = conn
            .query_row(
                "SELECT computed_sqft FROM listings WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(sqft.is_none());
    }

    #[test]
    fn backfill_leaves_price_per_sqft_null_without_price() {
        let conn = memory_store();
        conn.execute(
            "INSERT INTO listings (id, mls_number, size_interior)
             VALUES (1, 100, '93 m2')",
            [],
        )
        .unwrap();

        let stats = backfill_computed(&conn).unwrap();
        assert_eq!(stats.updated, 1);

        let (sqft, per_sqft): (Option<f64>, Option<f64>) = conn
            .query_row(
                "SELECT computed_sqft, computed_price_per_sqft FROM listings WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!(sqft.is_some());
        assert!(per_sqft.is_none());
    }

    #[test]
    fn open_read_only_fails_on_missing_store() {
        let missing = std::env::temp_dir().join("property_map_no_such_store.duckdb");
        let err = open_read_only(&missing).unwrap_err();
        assert!(matches!(err, DbError::StoreNotFound(_)));
    }
}
