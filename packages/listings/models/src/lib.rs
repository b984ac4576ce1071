#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Shared data model for the property map.
//!
//! These types represent listings as stored in and retrieved from the local
//! `DuckDB` dataset, the filter criteria accepted by the listing filter, and
//! the per-listing annotations loaded from the user's notes file.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One real-estate listing row as materialized from the dataset.
///
/// Almost every field is optional: the upstream feed omits data freely, and
/// the filter's optimistic-NULL policy depends on missing values staying
/// `None` rather than being coerced to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Primary key in the dataset.
    pub id: i64,
    /// External MLS reference number.
    pub mls_number: i64,
    /// Full address text, including any `|#NNN|` unit marker.
    pub address: Option<String>,
    /// Latitude (WGS84). `None` when missing or malformed in the dataset.
    pub latitude: Option<f64>,
    /// Longitude (WGS84). `None` when missing or malformed in the dataset.
    pub longitude: Option<f64>,
    /// Asking price in dollars. Non-negative when present.
    pub price: Option<i64>,
    /// Free-text parking description (e.g. "Attached Garage").
    pub parking: Option<String>,
    /// Number of parking spaces.
    pub parking_spaces: Option<i32>,
    /// Ownership type (e.g. "Undivided Co-ownership").
    pub ownership_type: Option<String>,
    /// Zoning type (e.g. "Agricultural", "Residential").
    pub zoning_type: Option<String>,
    /// Property type (e.g. "Vacant Land", "Single Family").
    pub property_type: Option<String>,
    /// Building type (e.g. "House", "Apartment"). Drives marker icons.
    pub building_type: Option<String>,
    /// Total stories in the building, when known.
    pub stories: Option<i32>,
    /// Bedroom count, when known.
    pub bedrooms: Option<i32>,
    /// Bathroom count, when known.
    pub bathrooms: Option<i32>,
    /// Total units in the building.
    pub units_total: Option<i32>,
    /// Whether the listing is flagged as new construction.
    pub new_build: Option<bool>,
    /// Raw interior size string as provided upstream (e.g. "1020 sqft",
    /// "95 m2").
    pub size_interior: Option<String>,
    /// Interior size normalized to square feet.
    pub computed_sqft: Option<f64>,
    /// Price divided by normalized interior size.
    pub computed_price_per_sqft: Option<f64>,
    /// Date the listing was last seen updated in the dataset.
    pub last_updated: Option<NaiveDate>,
    /// Date of the most recent recorded price change.
    pub price_change_date: Option<NaiveDate>,
    /// High-resolution photo URL.
    pub photo_url: Option<String>,
    /// Listing details page URL.
    pub details_url: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Free-text public remarks.
    pub remarks: Option<String>,
    /// Start of the next upcoming open house, when one is scheduled.
    pub open_house_at: Option<NaiveDateTime>,
}

/// One entry from a listing's price history, ordered by date ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    /// External MLS reference number.
    pub mls_number: i64,
    /// Price in dollars at `recorded_at`.
    pub price: i64,
    /// Date the price was recorded.
    pub recorded_at: NaiveDate,
}

/// A per-listing user note loaded from the notes file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Whether the listing should be kept. `false` hides it from exports
    /// and grays it out on the map.
    pub keep: bool,
    /// Optional free-text note shown in tooltips and exports.
    pub note: Option<String>,
}

/// Filter criteria for [`Listing`] queries.
///
/// Every threshold treats a missing field as passing: the filter excludes
/// only on known-and-failing data. Requirement-style flags (`has_garage`,
/// `must_have_size`, ...) demand known data by definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingCriteria {
    /// Lower price bound, exclusive.
    pub min_price: i64,
    /// Upper price bound, exclusive.
    pub max_price: i64,
    /// Exclude listings with no interior size information.
    pub must_have_size: bool,
    /// Exclude listings with no recorded price-change date.
    pub must_have_price_change: bool,
    /// Exclude flagged new builds.
    pub exclude_new_construction: bool,
    /// Exclude agricultural zoning and vacant-land property types.
    pub exclude_agricultural_zoning: bool,
    /// Exclude buildings with five or more stories, plus listings whose
    /// address unit number implies a fifth floor or higher.
    pub exclude_high_rise: bool,
    /// Retain only listings inside the configured area-of-interest polygon.
    pub within_area_of_interest: bool,
    /// Retain only listings within this many meters of any transit stop.
    pub min_transit_distance: Option<f64>,
    /// Exclude listings with a known bedroom count below this.
    pub min_bedrooms: Option<i64>,
    /// Exclude listings with a known interior size below this (sqft).
    pub min_size: Option<f64>,
    /// Exclude listings with a known price-per-sqft above this.
    pub max_price_per_size: Option<f64>,
    /// Exclude listings not updated within this many days. `None` disables.
    pub max_age_days: Option<i64>,
    /// Require a parking description containing a garage.
    pub has_garage: bool,
    /// Require any parking description. Ignored when `has_garage` is set.
    pub require_parking_info: bool,
    /// Exclude undivided co-ownership listings.
    pub exclude_undivided_ownership: bool,
    /// Require an open house scheduled now or later.
    pub require_upcoming_open_house: bool,
    /// Drop listings annotated `keep = false` at query time. Off by
    /// default: annotations normally only affect rendering and export.
    pub exclude_discarded: bool,
    /// Cap the result count. `-1` means unbounded.
    pub limit: i64,
}

impl Default for ListingCriteria {
    fn default() -> Self {
        Self {
            min_price: 100_000,
            max_price: 10_000_000,
            must_have_size: false,
            must_have_price_change: false,
            exclude_new_construction: true,
            exclude_agricultural_zoning: true,
            exclude_high_rise: true,
            within_area_of_interest: true,
            min_transit_distance: None,
            min_bedrooms: None,
            min_size: None,
            max_price_per_size: None,
            max_age_days: Some(14),
            has_garage: false,
            require_parking_info: false,
            exclude_undivided_ownership: false,
            require_upcoming_open_house: false,
            exclude_discarded: false,
            limit: -1,
        }
    }
}
