#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Artifact generation from filtered listings.
//!
//! Consumes the listing sequence produced by the filter — it issues no
//! queries of its own — and writes the interactive Leaflet map document
//! and the audit CSV. Markers, colors, heat data, and CSV rows each live
//! in their own module.

pub mod colors;
pub mod csv;
pub mod heat;
pub mod html;
pub mod markers;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use property_map_listings_models::{Annotation, Listing, PriceHistoryEntry};
use property_map_spatial::{AreaOfInterest, TransitIndex};

pub use heat::HeatWeight;
pub use html::Viewport;

/// Errors from artifact generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// I/O error writing an artifact.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Everything the map document needs besides the listings themselves.
#[derive(Debug)]
pub struct MapInputs<'a> {
    /// Viewport center and zoom.
    pub viewport: Viewport,
    /// Per-MLS annotations for marker styling and notes.
    pub annotations: &'a BTreeMap<i64, Annotation>,
    /// Price history per MLS number, oldest first, for delta indicators.
    pub history: &'a BTreeMap<i64, Vec<PriceHistoryEntry>>,
    /// Area-of-interest overlay, when configured.
    pub area_of_interest: Option<&'a AreaOfInterest>,
    /// Transit stop overlay, when configured.
    pub transit: Option<&'a TransitIndex>,
    /// Heat overlay weighting; `None` disables the layer.
    pub heat: Option<HeatWeight>,
    /// Transport tile layer API key, when available.
    pub transport_tile_key: Option<&'a str>,
    /// Date used for freshness glyphs.
    pub today: NaiveDate,
}

/// Counts from a map generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapSummary {
    /// Markers written to the document.
    pub markers: usize,
    /// Listings skipped for missing coordinates.
    pub skipped: usize,
}

/// Writes the interactive map document for a listing set.
///
/// # Errors
///
/// Returns [`GenerateError::Io`] if the file cannot be written.
pub fn write_map(
    path: &Path,
    listings: &[Listing],
    inputs: &MapInputs<'_>,
) -> Result<MapSummary, GenerateError> {
    let mut built = Vec::with_capacity(listings.len());
    let mut summary = MapSummary::default();

    for listing in listings {
        let annotation = inputs.annotations.get(&listing.mls_number);
        let history = inputs
            .history
            .get(&listing.mls_number)
            .map(Vec::as_slice);

        match markers::build_marker(listing, annotation, history, inputs.today) {
            Some(marker) => built.push(marker),
            None => summary.skipped += 1,
        }
    }
    summary.markers = built.len();

    if summary.skipped > 0 {
        log::warn!(
            "map generation: skipped {} listings with no usable coordinates",
            summary.skipped
        );
    }

    let aoi_vertices = inputs.area_of_interest.map(AreaOfInterest::vertices);
    let stops = inputs.transit.map(TransitIndex::stops);
    let heat_points = inputs
        .heat
        .map(|weight| heat::heat_points(listings, weight));

    let document = html::render_map(
        inputs.viewport,
        &built,
        aoi_vertices.as_deref(),
        stops.as_deref(),
        heat_points.as_deref(),
        inputs.transport_tile_key,
    );

    std::fs::write(path, document).map_err(|e| GenerateError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    log::info!(
        "Wrote map with {} markers to {}",
        summary.markers,
        path.display()
    );

    Ok(summary)
}

/// Writes the audit CSV for a listing set, returning the row count.
///
/// # Errors
///
/// Returns [`GenerateError`] if serialization or the file write fails.
pub fn write_csv(
    path: &Path,
    listings: &[Listing],
    annotations: &BTreeMap<i64, Annotation>,
) -> Result<u64, GenerateError> {
    let file = std::fs::File::create(path).map_err(|e| GenerateError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let written = csv::export_csv(file, listings, annotations)?;
    log::info!("Wrote {written} listings to {}", path.display());

    Ok(written)
}
