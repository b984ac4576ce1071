#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! The listing filter pipeline.
//!
//! [`ListingFilter`] turns a [`ListingCriteria`] into a final listing
//! sequence in a fixed order: one parameterized bulk query of every cheap
//! field predicate, then in-memory post-filters from cheapest to most
//! selective data — area-of-interest containment, transit proximity,
//! high-rise address pattern, and (opt-in) annotation exclusion.
//!
//! Post-filters only ever remove rows; the store's `ORDER BY id` order is
//! preserved, so identical criteria against an unchanged store yield
//! identical results.
//!
//! Missing data is handled optimistically: a threshold never excludes a
//! row whose field is unknown. The exceptions are documented where they
//! live — the strict price band (a NULL price cannot sit inside a band)
//! and the geometric filters, which count and skip rows with no usable
//! coordinates rather than silently passing them.

pub mod highrise;

use std::collections::BTreeMap;

use duckdb::Connection;
use property_map_database::{DbError, predicates, queries};
use property_map_listings_models::{Annotation, Listing, ListingCriteria};
use property_map_spatial::{AreaOfInterest, TransitIndex};

/// Invalid criteria combinations, rejected before any query runs.
#[derive(Debug, thiserror::Error)]
pub enum CriteriaError {
    /// The price band is empty or inverted.
    #[error("Invalid price band: min {min} must be below max {max}")]
    InvalidPriceBand {
        /// Exclusive lower bound.
        min: i64,
        /// Exclusive upper bound.
        max: i64,
    },

    /// A threshold that must be positive is zero or negative.
    #[error("{name} must be positive, got {value}")]
    NonPositiveThreshold {
        /// Criterion name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The result cap is below the unbounded sentinel.
    #[error("Invalid limit {0}: use -1 for unbounded or a non-negative cap")]
    InvalidLimit(i64),
}

/// Errors from the filter pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Criteria validation failed.
    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    /// The store query failed.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Session-scoped context for the filter: the optional geometry sources
/// and the annotation lookup, loaded once at startup and passed in
/// explicitly. An absent optional source disables the corresponding
/// filter instead of changing defaults.
#[derive(Debug, Default)]
pub struct FilterContext {
    /// Area-of-interest polygon, when configured.
    pub area_of_interest: Option<AreaOfInterest>,
    /// Transit stop index, when configured.
    pub transit: Option<TransitIndex>,
    /// Per-MLS annotations, possibly empty.
    pub annotations: BTreeMap<i64, Annotation>,
}

/// The core filter: read-only over the store, stateless between calls.
pub struct ListingFilter<'a> {
    conn: &'a Connection,
    context: &'a FilterContext,
}

impl<'a> ListingFilter<'a> {
    /// Creates a filter over an open store connection.
    #[must_use]
    pub const fn new(conn: &'a Connection, context: &'a FilterContext) -> Self {
        Self { conn, context }
    }

    /// Produces the listings matching `criteria`, anchored at the current
    /// local time.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Criteria`] for invalid criteria and
    /// [`FilterError::Database`] if the bulk query fails.
    pub fn filter_listings(&self, criteria: &ListingCriteria) -> Result<Vec<Listing>, FilterError> {
        self.filter_listings_at(criteria, chrono::Local::now().naive_local())
    }

    /// [`Self::filter_listings`] with an explicit time anchor for the
    /// recency and open-house cutoffs. Deterministic under test.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Criteria`] for invalid criteria and
    /// [`FilterError::Database`] if the bulk query fails.
    pub fn filter_listings_at(
        &self,
        criteria: &ListingCriteria,
        now: chrono::NaiveDateTime,
    ) -> Result<Vec<Listing>, FilterError> {
        validate(criteria)?;

        let predicate_set = predicates::from_criteria(criteria, now);
        let mut listings =
            queries::fetch_listings(self.conn, &predicate_set, now, criteria.limit)?;

        if criteria.within_area_of_interest {
            if let Some(aoi) = &self.context.area_of_interest {
                listings = retain_with_coordinates(listings, "area of interest", |lat, lng| {
                    aoi.contains(lat, lng)
                });
            }
        }

        if let Some(meters) = criteria.min_transit_distance {
            if let Some(transit) = self.context.transit.as_ref().filter(|t| !t.is_empty()) {
                listings = retain_with_coordinates(listings, "transit proximity", |lat, lng| {
                    transit.any_within(lat, lng, meters)
                });
            }
        }

        if criteria.exclude_high_rise {
            let before = listings.len();
            listings.retain(|listing| {
                listing
                    .address
                    .as_deref()
                    .is_none_or(|addr| !highrise::is_high_rise_address(addr))
            });
            log::info!(
                "high-rise address filter: {before} -> {} listings",
                listings.len()
            );
        }

        if criteria.exclude_discarded && !self.context.annotations.is_empty() {
            let before = listings.len();
            listings.retain(|listing| {
                self.context
                    .annotations
                    .get(&listing.mls_number)
                    .is_none_or(|note| note.keep)
            });
            log::info!(
                "annotation filter: {before} -> {} listings",
                listings.len()
            );
        }

        Ok(listings)
    }
}

/// Applies a coordinate-based filter, counting and skipping rows that
/// have no usable coordinates.
fn retain_with_coordinates(
    listings: Vec<Listing>,
    label: &str,
    keep: impl Fn(f64, f64) -> bool,
) -> Vec<Listing> {
    let before = listings.len();
    let mut missing = 0usize;

    let kept: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| match (listing.latitude, listing.longitude) {
            (Some(lat), Some(lng)) => keep(lat, lng),
            _ => {
                missing += 1;
                false
            }
        })
        .collect();

    if missing > 0 {
        log::warn!("{label} filter: skipped {missing} listings with no usable coordinates");
    }
    log::info!("{label} filter: {before} -> {} listings", kept.len());

    kept
}

#[allow(clippy::cast_precision_loss)]
fn validate(criteria: &ListingCriteria) -> Result<(), CriteriaError> {
    if criteria.min_price >= criteria.max_price {
        return Err(CriteriaError::InvalidPriceBand {
            min: criteria.min_price,
            max: criteria.max_price,
        });
    }

    let positive = [
        ("min_transit_distance", criteria.min_transit_distance),
        ("min_size", criteria.min_size),
        ("max_price_per_size", criteria.max_price_per_size),
        ("min_bedrooms", criteria.min_bedrooms.map(|v| v as f64)),
        ("max_age_days", criteria.max_age_days.map(|v| v as f64)),
    ];
    for (name, value) in positive {
        if let Some(value) = value {
            if value <= 0.0 {
                return Err(CriteriaError::NonPositiveThreshold { name, value });
            }
        }
    }

    if criteria.limit < -1 {
        return Err(CriteriaError::InvalidLimit(criteria.limit));
    }

    Ok(())
}
