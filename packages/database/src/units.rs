//! Interior size normalization.
//!
//! Upstream listings carry interior size as a free-text `"<number> <unit>"`
//! string. Conversion to square feet must fail loudly on anything it does
//! not recognize — a silently coerced zero poisons every price-per-sqft
//! figure derived from it.

use std::str::FromStr as _;

use strum_macros::EnumString;

/// Square feet per square meter.
const SQFT_PER_SQM: f64 = 10.764;

/// Recognized interior size units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum SizeUnit {
    /// Square feet.
    #[strum(serialize = "sqft")]
    Sqft,
    /// Square meters.
    #[strum(serialize = "m2")]
    SquareMeters,
}

/// Errors from interior size parsing.
#[derive(Debug, thiserror::Error)]
pub enum UnitParseError {
    /// The string did not split into `<number> <unit>`.
    #[error("Malformed size string: {0:?}")]
    Malformed(String),

    /// The numeric part did not parse.
    #[error("Invalid size number in {0:?}")]
    InvalidNumber(String),

    /// The unit part is not a recognized unit.
    #[error("Unknown size unit {unit:?} in {raw:?}")]
    UnknownUnit {
        /// The unrecognized unit token.
        unit: String,
        /// The full input string.
        raw: String,
    },
}

/// Converts an interior size string (e.g. `"1000 sqft"`, `"93 m2"`) to
/// square feet.
///
/// # Errors
///
/// Returns [`UnitParseError`] if the string is malformed, the number does
/// not parse, or the unit is not recognized. Unknown units are never
/// treated as zero.
pub fn to_sqft(size_interior: &str) -> Result<f64, UnitParseError> {
    let mut parts = size_interior.split_whitespace();

    let (Some(number), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(UnitParseError::Malformed(size_interior.to_string()));
    };

    let value: f64 = number
        .parse()
        .map_err(|_| UnitParseError::InvalidNumber(size_interior.to_string()))?;

    let unit = SizeUnit::from_str(unit).map_err(|_| UnitParseError::UnknownUnit {
        unit: unit.to_string(),
        raw: size_interior.to_string(),
    })?;

    Ok(match unit {
        SizeUnit::Sqft => value,
        SizeUnit::SquareMeters => value * SQFT_PER_SQM,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_sqft_verbatim() {
        assert!((to_sqft("1000 sqft").unwrap() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn converts_square_meters() {
        assert!((to_sqft("100 m2").unwrap() - 1076.4).abs() < 1e-9);
    }

    #[test]
    fn rejects_unknown_unit() {
        let err = to_sqft("100 xyz").unwrap_err();
        assert!(matches!(err, UnitParseError::UnknownUnit { .. }));
    }

    #[test]
    fn rejects_missing_unit() {
        let err = to_sqft("1000").unwrap_err();
        assert!(matches!(err, UnitParseError::Malformed(_)));
    }

    #[test]
    fn rejects_bad_number() {
        let err = to_sqft("lots sqft").unwrap_err();
        assert!(matches!(err, UnitParseError::InvalidNumber(_)));
    }

    #[test]
    fn rejects_trailing_tokens() {
        let err = to_sqft("1000 sqft approx").unwrap_err();
        assert!(matches!(err, UnitParseError::Malformed(_)));
    }
}
