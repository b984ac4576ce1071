//! Audit CSV export.
//!
//! Writes the filtered listing set with a fixed column order for review
//! in a spreadsheet. Listings annotated `keep = false` are omitted; notes
//! are joined into their own column.

use std::collections::BTreeMap;
use std::io::Write;

use property_map_listings_models::{Annotation, Listing};

use crate::GenerateError;

/// Export column order.
const COLUMNS: &[&str] = &[
    "mls_number",
    "note",
    "price",
    "price_per_sqft",
    "address",
    "sqft",
    "parking",
    "parking_spaces",
    "ownership_type",
    "property_type",
    "building_type",
    "stories",
    "bedrooms",
    "bathrooms",
    "size_interior",
    "last_updated",
    "price_change_date",
    "photo_url",
    "details_url",
    "remarks",
];

/// Writes listings as CSV, returning the number of rows written.
///
/// # Errors
///
/// Returns [`GenerateError`] if serialization or the underlying writer
/// fails.
pub fn export_csv<W: Write>(
    writer: W,
    listings: &[Listing],
    annotations: &BTreeMap<i64, Annotation>,
) -> Result<u64, GenerateError> {
    let mut out = ::csv::Writer::from_writer(writer);
    out.write_record(COLUMNS)?;

    let mut written = 0u64;
    for listing in listings {
        let annotation = annotations.get(&listing.mls_number);
        if annotation.is_some_and(|a| !a.keep) {
            continue;
        }
        let note = annotation.and_then(|a| a.note.as_deref()).unwrap_or("");

        out.write_record(&[
            listing.mls_number.to_string(),
            note.to_string(),
            opt_num(listing.price),
            opt_float(listing.computed_price_per_sqft),
            opt_str(listing.address.as_deref()),
            opt_float(listing.computed_sqft),
            opt_str(listing.parking.as_deref()),
            opt_num(listing.parking_spaces),
            opt_str(listing.ownership_type.as_deref()),
            opt_str(listing.property_type.as_deref()),
            opt_str(listing.building_type.as_deref()),
            opt_num(listing.stories),
            opt_num(listing.bedrooms),
            opt_num(listing.bathrooms),
            opt_str(listing.size_interior.as_deref()),
            listing
                .last_updated
                .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string()),
            listing
                .price_change_date
                .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string()),
            opt_str(listing.photo_url.as_deref()),
            opt_str(listing.details_url.as_deref()),
            opt_str(listing.remarks.as_deref()),
        ])?;
        written += 1;
    }

    out.flush().map_err(|e| GenerateError::Io {
        path: "<csv sink>".to_string(),
        source: e,
    })?;

    Ok(written)
}

fn opt_str(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn opt_num<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

fn opt_float(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{v:.1}"))
}
