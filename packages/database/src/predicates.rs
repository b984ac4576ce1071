//! Typed predicate builder for listing queries.
//!
//! Each filter criterion becomes a [`Predicate`] variant that renders to a
//! parameterized SQL fragment — `?` placeholders plus typed parameters,
//! never interpolated literals. The predicate list is ordered, enumerable,
//! and testable without touching a database.
//!
//! NULL semantics are optimistic throughout: a threshold predicate lets a
//! row with an unknown field pass and excludes only on known-and-failing
//! data. Requirement predicates (`HasGarage`, `HasInteriorSize`, ...)
//! demand known data by definition. The price band is the one exception —
//! a row with no price cannot satisfy a strict band.

use chrono::{NaiveDate, NaiveDateTime};
use property_map_listings_models::ListingCriteria;

/// Ownership type excluded by [`Predicate::NotUndividedOwnership`].
const UNDIVIDED_OWNERSHIP: &str = "Undivided Co-ownership";

/// Zoning type excluded by [`Predicate::NotAgricultural`].
const AGRICULTURAL_ZONING: &str = "Agricultural";

/// Property type excluded by [`Predicate::NotAgricultural`].
const VACANT_LAND_TYPE: &str = "Vacant Land";

/// Story count at which a building counts as a high rise.
const HIGH_RISE_STORIES: i64 = 5;

/// A typed query parameter bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// 64-bit integer parameter.
    Int(i64),
    /// Floating-point parameter.
    Real(f64),
    /// Text parameter.
    Text(String),
}

impl duckdb::ToSql for SqlParam {
    fn to_sql(&self) -> duckdb::Result<duckdb::types::ToSqlOutput<'_>> {
        match self {
            Self::Int(v) => v.to_sql(),
            Self::Real(v) => v.to_sql(),
            Self::Text(v) => v.to_sql(),
        }
    }
}

/// A rendered SQL fragment: a clause with `?` placeholders and its
/// parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// Parenthesized boolean clause.
    pub clause: String,
    /// Parameters, one per `?` in `clause`.
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    fn new(clause: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }
}

/// One field-level filter, translated to SQL by [`Predicate::to_sql`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Strict price band: `min < price < max`.
    PriceBetween {
        /// Exclusive lower bound.
        min: i64,
        /// Exclusive upper bound.
        max: i64,
    },
    /// Exclude agricultural zoning and vacant-land property types.
    NotAgricultural,
    /// Exclude buildings with a known story count at or above the
    /// high-rise threshold.
    NotHighRiseStories,
    /// Exclude flagged new builds.
    NotNewBuild,
    /// Require a raw interior size string.
    HasInteriorSize,
    /// Require a recorded price-change date.
    HasPriceChange,
    /// Exclude listings with a known bedroom count below the threshold.
    MinBedrooms(i64),
    /// Exclude listings last updated before the cutoff date.
    UpdatedSince(NaiveDate),
    /// Exclude listings with a known normalized size below the threshold.
    MinComputedSqft(f64),
    /// Exclude listings with a known price-per-sqft above the threshold.
    MaxPricePerSqft(f64),
    /// Require a parking description containing a garage.
    HasGarage,
    /// Require any parking description.
    HasParkingInfo,
    /// Exclude undivided co-ownership listings.
    NotUndividedOwnership,
    /// Require an open house starting at or after the given instant.
    HasUpcomingOpenHouse(NaiveDateTime),
}

impl Predicate {
    /// Renders this predicate as a parameterized SQL fragment.
    #[must_use]
    pub fn to_sql(&self) -> SqlFragment {
        match self {
            Self::PriceBetween { min, max } => SqlFragment::new(
                "(price > ? AND price < ?)",
                vec![SqlParam::Int(*min), SqlParam::Int(*max)],
            ),
            Self::NotAgricultural => SqlFragment::new(
                "((zoning_type IS NULL OR zoning_type <> ?) \
                 AND (property_type IS NULL OR property_type <> ?))",
                vec![
                    SqlParam::Text(AGRICULTURAL_ZONING.to_string()),
                    SqlParam::Text(VACANT_LAND_TYPE.to_string()),
                ],
            ),
            Self::NotHighRiseStories => SqlFragment::new(
                "(stories IS NULL OR stories < ?)",
                vec![SqlParam::Int(HIGH_RISE_STORIES)],
            ),
            Self::NotNewBuild => {
                SqlFragment::new("(new_build IS NULL OR new_build = FALSE)", vec![])
            }
            Self::HasInteriorSize => SqlFragment::new("(size_interior IS NOT NULL)", vec![]),
            Self::HasPriceChange => SqlFragment::new("(price_change_date IS NOT NULL)", vec![]),
            Self::MinBedrooms(min) => SqlFragment::new(
                "(bedrooms IS NULL OR bedrooms >= ?)",
                vec![SqlParam::Int(*min)],
            ),
            Self::UpdatedSince(cutoff) => SqlFragment::new(
                "(last_updated IS NULL OR last_updated >= ?)",
                vec![SqlParam::Text(cutoff.format("%Y-%m-%d").to_string())],
            ),
            Self::MinComputedSqft(min) => SqlFragment::new(
                "(computed_sqft IS NULL OR computed_sqft >= ?)",
                vec![SqlParam::Real(*min)],
            ),
            Self::MaxPricePerSqft(max) => SqlFragment::new(
                "(computed_price_per_sqft IS NULL OR computed_price_per_sqft <= ?)",
                vec![SqlParam::Real(*max)],
            ),
            Self::HasGarage => SqlFragment::new(
                "(parking LIKE ?)",
                vec![SqlParam::Text("%Garage%".to_string())],
            ),
            Self::HasParkingInfo => SqlFragment::new("(parking IS NOT NULL)", vec![]),
            Self::NotUndividedOwnership => SqlFragment::new(
                "(ownership_type IS NULL OR ownership_type <> ?)",
                vec![SqlParam::Text(UNDIVIDED_OWNERSHIP.to_string())],
            ),
            Self::HasUpcomingOpenHouse(now) => SqlFragment::new(
                "EXISTS (SELECT 1 FROM open_houses oh \
                 WHERE oh.mls_number = listings.mls_number AND oh.starts_at >= ?)",
                vec![SqlParam::Text(now.format("%Y-%m-%d %H:%M:%S").to_string())],
            ),
        }
    }
}

/// Builds the ordered predicate list for a criteria set.
///
/// Cheap field predicates only — the geometric and regex filters run
/// in-memory after the bulk query. `now` is passed in so that recency and
/// open-house cutoffs are deterministic under test.
#[must_use]
pub fn from_criteria(criteria: &ListingCriteria, now: NaiveDateTime) -> Vec<Predicate> {
    let mut predicates = vec![Predicate::PriceBetween {
        min: criteria.min_price,
        max: criteria.max_price,
    }];

    if criteria.exclude_agricultural_zoning {
        predicates.push(Predicate::NotAgricultural);
    }
    if criteria.exclude_high_rise {
        predicates.push(Predicate::NotHighRiseStories);
    }
    if criteria.exclude_new_construction {
        predicates.push(Predicate::NotNewBuild);
    }
    if criteria.must_have_size {
        predicates.push(Predicate::HasInteriorSize);
    }
    if criteria.must_have_price_change {
        predicates.push(Predicate::HasPriceChange);
    }
    if let Some(min) = criteria.min_bedrooms {
        predicates.push(Predicate::MinBedrooms(min));
    }
    if let Some(days) = criteria.max_age_days {
        let cutoff = now.date() - chrono::Days::new(days.unsigned_abs());
        predicates.push(Predicate::UpdatedSince(cutoff));
    }
    if let Some(min) = criteria.min_size {
        predicates.push(Predicate::MinComputedSqft(min));
    }
    if let Some(max) = criteria.max_price_per_size {
        predicates.push(Predicate::MaxPricePerSqft(max));
    }
    if criteria.has_garage {
        predicates.push(Predicate::HasGarage);
    } else if criteria.require_parking_info {
        predicates.push(Predicate::HasParkingInfo);
    }
    if criteria.exclude_undivided_ownership {
        predicates.push(Predicate::NotUndividedOwnership);
    }
    if criteria.require_upcoming_open_house {
        predicates.push(Predicate::HasUpcomingOpenHouse(now));
    }

    predicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn price_band_is_strict_and_parameterized() {
        let frag = Predicate::PriceBetween {
            min: 100_000,
            max: 10_000_000,
        }
        .to_sql();
        assert_eq!(frag.clause, "(price > ? AND price < ?)");
        assert_eq!(
            frag.params,
            vec![SqlParam::Int(100_000), SqlParam::Int(10_000_000)]
        );
    }

    #[test]
    fn fragments_never_interpolate_values() {
        let predicates = from_criteria(
            &ListingCriteria {
                min_bedrooms: Some(3),
                min_size: Some(900.0),
                max_price_per_size: Some(700.0),
                has_garage: true,
                exclude_undivided_ownership: true,
                require_upcoming_open_house: true,
                ..ListingCriteria::default()
            },
            test_now(),
        );

        for predicate in &predicates {
            let frag = predicate.to_sql();
            let placeholders = frag.clause.matches('?').count();
            assert_eq!(
                placeholders,
                frag.params.len(),
                "placeholder/param mismatch in {frag:?}"
            );
            // Criteria values must only ever appear as bound params.
            assert!(!frag.clause.contains("900"), "literal leaked: {frag:?}");
            assert!(!frag.clause.contains("700"), "literal leaked: {frag:?}");
        }
    }

    #[test]
    fn default_criteria_build_expected_predicates() {
        let predicates = from_criteria(&ListingCriteria::default(), test_now());
        assert_eq!(
            predicates,
            vec![
                Predicate::PriceBetween {
                    min: 100_000,
                    max: 10_000_000,
                },
                Predicate::NotAgricultural,
                Predicate::NotHighRiseStories,
                Predicate::NotNewBuild,
                Predicate::UpdatedSince(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            ]
        );
    }

    #[test]
    fn garage_requirement_supersedes_parking_info() {
        let predicates = from_criteria(
            &ListingCriteria {
                has_garage: true,
                require_parking_info: true,
                ..ListingCriteria::default()
            },
            test_now(),
        );
        assert!(predicates.contains(&Predicate::HasGarage));
        assert!(!predicates.contains(&Predicate::HasParkingInfo));
    }

    #[test]
    fn recency_cutoff_is_now_minus_max_age() {
        let predicates = from_criteria(
            &ListingCriteria {
                max_age_days: Some(7),
                ..ListingCriteria::default()
            },
            test_now(),
        );
        assert!(predicates.contains(&Predicate::UpdatedSince(
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
        )));
    }

    #[test]
    fn disabled_recency_builds_no_cutoff() {
        let predicates = from_criteria(
            &ListingCriteria {
                max_age_days: None,
                ..ListingCriteria::default()
            },
            test_now(),
        );
        assert!(
            !predicates
                .iter()
                .any(|p| matches!(p, Predicate::UpdatedSince(_)))
        );
    }
}
