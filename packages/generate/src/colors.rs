//! Price-per-sqft color ramp for marker icons.

/// Lower ramp bound; anything cheaper renders full green.
const RAMP_MIN: f64 = 309.0;

/// Upper ramp bound; anything pricier renders full red.
const RAMP_MAX: f64 = 1085.0;

/// Maps a value onto a green-to-red hex color between `min` and `max`,
/// clamping at both ends.
#[must_use]
pub fn ramp_color(value: f64, min: f64, max: f64) -> String {
    let clamped = value.clamp(min, max);
    let per_unit = 255.0 / max;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let red = (per_unit * clamped) as u8;
    format!("#{red:02x}{:02x}00", 255 - red)
}

/// [`ramp_color`] with the price-per-sqft bounds used on the map.
#[must_use]
pub fn price_per_sqft_color(value: f64) -> String {
    ramp_color(value, RAMP_MIN, RAMP_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheap_listings_clamp_to_the_green_end() {
        assert_eq!(price_per_sqft_color(100.0), price_per_sqft_color(309.0));
    }

    #[test]
    fn expensive_listings_clamp_to_full_red() {
        assert_eq!(price_per_sqft_color(5000.0), "#ff0000");
        assert_eq!(price_per_sqft_color(1085.0), "#ff0000");
    }

    #[test]
    fn midpoint_mixes_red_and_green() {
        let color = price_per_sqft_color(700.0);
        assert!(color.starts_with('#'));
        assert_eq!(color.len(), 7);
        assert!(color.ends_with("00"));
        assert_ne!(color, "#ff0000");
    }

    #[test]
    fn higher_values_are_redder() {
        let low = u8::from_str_radix(&price_per_sqft_color(400.0)[1..3], 16).unwrap();
        let high = u8::from_str_radix(&price_per_sqft_color(900.0)[1..3], 16).unwrap();
        assert!(high > low);
    }
}
