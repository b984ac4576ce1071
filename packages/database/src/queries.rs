//! Query functions for the listings store.
//!
//! The bulk listing query is assembled from the typed predicate list in
//! [`crate::predicates`] — clauses joined with `AND`, parameters bound in
//! placeholder order, `LIMIT` as a proper clause. Result order is always
//! `ORDER BY id` so repeated queries against an unchanged store return
//! identical sequences.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use duckdb::Connection;
use property_map_listings_models::{Listing, PriceHistoryEntry};

use crate::DbError;
use crate::predicates::{Predicate, SqlParam};

/// Columns selected for every listing query, in [`listing_from_row`] order.
const LISTING_COLUMNS: &str = "id, mls_number, address, latitude, longitude, price, \
     parking, parking_spaces, ownership_type, zoning_type, property_type, \
     building_type, stories, bedrooms, bathrooms, units_total, new_build, \
     size_interior, computed_sqft, computed_price_per_sqft, last_updated, \
     price_change_date, photo_url, details_url, postal_code, remarks";

/// Executes the bulk listing query for an ordered predicate list.
///
/// `now` anchors the upcoming-open-house column; `limit` caps the result
/// count, with `-1` meaning unbounded.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn fetch_listings(
    conn: &Connection,
    predicates: &[Predicate],
    now: NaiveDateTime,
    limit: i64,
) -> Result<Vec<Listing>, DbError> {
    let mut sql = format!(
        "SELECT {LISTING_COLUMNS}, \
         (SELECT min(oh.starts_at) FROM open_houses oh \
          WHERE oh.mls_number = listings.mls_number AND oh.starts_at >= ?) \
         AS open_house_at \
         FROM listings"
    );

    let mut params: Vec<SqlParam> =
        vec![SqlParam::Text(now.format("%Y-%m-%d %H:%M:%S").to_string())];

    if !predicates.is_empty() {
        let clauses: Vec<String> = predicates
            .iter()
            .map(|p| {
                let frag = p.to_sql();
                params.extend(frag.params);
                frag.clause
            })
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    sql.push_str(" ORDER BY id");

    if limit >= 0 {
        sql.push_str(" LIMIT ?");
        params.push(SqlParam::Int(limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(duckdb::params_from_iter(params.iter()))?;

    let mut listings = Vec::new();
    while let Some(row) = rows.next()? {
        listings.push(listing_from_row(row)?);
    }

    log::info!("Received {} listings from the store", listings.len());

    Ok(listings)
}

/// Returns the price history for one MLS number, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn fetch_price_history(
    conn: &Connection,
    mls_number: i64,
) -> Result<Vec<PriceHistoryEntry>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT mls_number, price, recorded_at
         FROM price_history
         WHERE mls_number = ?
         ORDER BY recorded_at",
    )?;

    let mut rows = stmt.query(duckdb::params![mls_number])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        if let Some(entry) = history_from_row(row)? {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Returns the full price history grouped by MLS number, oldest first
/// within each group.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn fetch_all_price_history(
    conn: &Connection,
) -> Result<BTreeMap<i64, Vec<PriceHistoryEntry>>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT mls_number, price, recorded_at
         FROM price_history
         ORDER BY mls_number, recorded_at",
    )?;

    let mut rows = stmt.query([])?;
    let mut history: BTreeMap<i64, Vec<PriceHistoryEntry>> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        if let Some(entry) = history_from_row(row)? {
            history.entry(entry.mls_number).or_default().push(entry);
        }
    }

    Ok(history)
}

fn history_from_row(row: &duckdb::Row<'_>) -> Result<Option<PriceHistoryEntry>, DbError> {
    let mls_number: i64 = row.get(0)?;
    let price: i64 = row.get(1)?;
    let recorded_at: String = row.get(2)?;

    let Some(recorded_at) = parse_date("recorded_at", mls_number, Some(recorded_at)) else {
        return Ok(None);
    };

    Ok(Some(PriceHistoryEntry {
        mls_number,
        price,
        recorded_at,
    }))
}

fn listing_from_row(row: &duckdb::Row<'_>) -> Result<Listing, DbError> {
    let mls_number: i64 = row.get(1)?;

    let latitude: Option<f64> = row.get(3)?;
    let longitude: Option<f64> = row.get(4)?;
    let (latitude, longitude) = validate_coordinates(mls_number, latitude, longitude);

    let last_updated: Option<String> = row.get(20)?;
    let price_change_date: Option<String> = row.get(21)?;
    let open_house_at: Option<String> = row.get(26)?;

    Ok(Listing {
        id: row.get(0)?,
        mls_number,
        address: row.get(2)?,
        latitude,
        longitude,
        price: row.get(5)?,
        parking: row.get(6)?,
        parking_spaces: row.get(7)?,
        ownership_type: row.get(8)?,
        zoning_type: row.get(9)?,
        property_type: row.get(10)?,
        building_type: row.get(11)?,
        stories: row.get(12)?,
        bedrooms: row.get(13)?,
        bathrooms: row.get(14)?,
        units_total: row.get(15)?,
        new_build: row.get(16)?,
        size_interior: row.get(17)?,
        computed_sqft: row.get(18)?,
        computed_price_per_sqft: row.get(19)?,
        last_updated: parse_date("last_updated", mls_number, last_updated),
        price_change_date: parse_date("price_change_date", mls_number, price_change_date),
        photo_url: row.get(22)?,
        details_url: row.get(23)?,
        postal_code: row.get(24)?,
        remarks: row.get(25)?,
        open_house_at: parse_datetime("open_house_at", mls_number, open_house_at),
    })
}

/// Parses a stored ISO date, logging and dropping malformed values
/// instead of coercing them.
fn parse_date(field: &str, mls_number: i64, value: Option<String>) -> Option<NaiveDate> {
    let raw = value?;
    // Timestamps are accepted where a date is expected by taking the date
    // part; upstream mixes the two for price-change dates.
    let date_part = raw.get(..10).unwrap_or(&raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            log::warn!("listing {mls_number}: malformed {field} {raw:?}, dropping");
            None
        }
    }
}

fn parse_datetime(field: &str, mls_number: i64, value: Option<String>) -> Option<NaiveDateTime> {
    let raw = value?;
    match NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => Some(dt),
        Err(_) => {
            log::warn!("listing {mls_number}: malformed {field} {raw:?}, dropping");
            None
        }
    }
}

/// Drops coordinates that are missing, zeroed, or outside WGS84 range.
fn validate_coordinates(
    mls_number: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => {
            if lat == 0.0 && lng == 0.0 {
                log::warn!("listing {mls_number}: zeroed coordinates, dropping");
                (None, None)
            } else if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
                (Some(lat), Some(lng))
            } else {
                log::warn!("listing {mls_number}: coordinates ({lat}, {lng}) out of range");
                (None, None)
            }
        }
        _ => (None, None),
    }
}
