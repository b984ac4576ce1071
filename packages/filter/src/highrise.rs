//! Address-based high-rise detection.
//!
//! Story counts are missing for most apartment listings, so the filter
//! also reads the unit marker embedded in the address text. A unit number
//! of 500-999 or any four-digit unit implies a fifth floor or higher
//! under the local numbering scheme.

use std::sync::LazyLock;

use regex::Regex;

/// Unit markers implying floor 5+: `|#512|`, `|#1203|`, but not `|#305|`.
static HIGH_RISE_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|#([5-9]\d{2}|\d{4})\|").expect("valid regex"));

/// Whether the address text carries a unit marker implying a high rise.
#[must_use]
pub fn is_high_rise_address(address: &str) -> bool {
    HIGH_RISE_UNIT.is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_floor_unit_matches() {
        assert!(is_high_rise_address("4850 Ch. de la Cote-St-Luc |#512|, Montreal"));
    }

    #[test]
    fn third_floor_unit_does_not_match() {
        assert!(!is_high_rise_address("4850 Ch. de la Cote-St-Luc |#305|, Montreal"));
    }

    #[test]
    fn four_digit_unit_matches() {
        assert!(is_high_rise_address("1 Place Ville-Marie |#1203|, Montreal"));
    }

    #[test]
    fn nine_hundreds_unit_matches() {
        assert!(is_high_rise_address("123 Rue Main |#999|"));
    }

    #[test]
    fn address_without_unit_marker_does_not_match() {
        assert!(!is_high_rise_address("123 Rue Main, Montreal"));
    }

    #[test]
    fn bare_number_without_marker_does_not_match() {
        assert!(!is_high_rise_address("512 Rue Main"));
    }
}
