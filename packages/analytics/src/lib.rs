#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Summary statistics over filtered listing sets.
//!
//! Answers the "what does this neighborhood actually cost" question for a
//! filtered sample: arithmetic and geometric mean, sample standard
//! deviation, and median of price-per-sqft. Listings without a usable
//! price-per-sqft are counted and skipped, never imputed.

use property_map_listings_models::Listing;

/// Price-per-sqft summary over a listing set.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePerSqftStats {
    /// Listings contributing a usable price-per-sqft.
    pub count: usize,
    /// Listings skipped for a missing or non-positive figure.
    pub skipped: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Geometric mean.
    pub geometric_mean: f64,
    /// Sample standard deviation; `None` below two samples.
    pub std_dev: Option<f64>,
    /// Median.
    pub median: f64,
}

/// Computes price-per-sqft statistics, or `None` when no listing in the
/// set carries a usable figure.
#[must_use]
pub fn price_per_sqft_stats(listings: &[Listing]) -> Option<PricePerSqftStats> {
    let mut values: Vec<f64> = Vec::with_capacity(listings.len());
    let mut skipped = 0usize;

    for listing in listings {
        match listing.computed_price_per_sqft {
            Some(value) if value > 0.0 => values.push(value),
            _ => skipped += 1,
        }
    }

    if values.is_empty() {
        if skipped > 0 {
            log::warn!("price-per-sqft stats: no usable values in {skipped} listings");
        }
        return None;
    }

    values.sort_by(f64::total_cmp);

    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let geometric_mean = (values.iter().map(|v| v.ln()).sum::<f64>() / n).exp();

    let std_dev = (values.len() >= 2).then(|| {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    });

    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        f64::midpoint(values[mid - 1], values[mid])
    } else {
        values[mid]
    };

    Some(PricePerSqftStats {
        count: values.len(),
        skipped,
        mean,
        geometric_mean,
        std_dev,
        median,
    })
}
