//! Per-listing map marker construction.
//!
//! Builds the tooltip, popup HTML, icon choice, and colors for one
//! listing. Listings with no usable coordinates produce no marker; the
//! caller counts them.

use chrono::NaiveDate;
use property_map_listings_models::{Annotation, Listing, PriceHistoryEntry};

use crate::colors;

/// Days after which a listing stops counting as freshly updated.
const FRESH_DAYS: i64 = 7;

/// A fully resolved map marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Marker latitude.
    pub latitude: f64,
    /// Marker longitude.
    pub longitude: f64,
    /// One-line hover tooltip.
    pub tooltip: String,
    /// Popup HTML body.
    pub popup_html: String,
    /// Font Awesome icon name.
    pub icon: &'static str,
    /// Marker pin color (named Leaflet color).
    pub marker_color: &'static str,
    /// Icon glyph color (CSS color).
    pub icon_color: String,
}

/// Builds the marker for one listing, or `None` when it has no usable
/// coordinates.
#[must_use]
pub fn build_marker(
    listing: &Listing,
    annotation: Option<&Annotation>,
    history: Option<&[PriceHistoryEntry]>,
    today: NaiveDate,
) -> Option<Marker> {
    let (latitude, longitude) = match (listing.latitude, listing.longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return None,
    };

    let note = annotation.and_then(|a| a.note.as_deref()).unwrap_or("");

    let internet_status = if note.to_lowercase().contains("bad_internet") {
        "📠"
    } else {
        ""
    };

    let freshness = listing.last_updated.map_or("", |updated| {
        if today.signed_duration_since(updated).num_days() <= FRESH_DAYS {
            "👶"
        } else {
            "👴"
        }
    });

    let garage_status = match listing.parking.as_deref() {
        None => "❓🅿️",
        Some(parking) if parking.contains("Garage") => "🅿️",
        Some(_) => "🤔🅿️",
    };

    let price_trend = price_trend(listing, history);

    let icon_color = listing
        .computed_price_per_sqft
        .map_or_else(|| "blue".to_string(), colors::price_per_sqft_color);

    let (icon, marker_color) = icon_for(listing, annotation);

    let price = listing.price.map_or_else(|| "?".to_string(), |p| p.to_string());
    let per_sqft = listing
        .computed_price_per_sqft
        .map_or_else(|| "?".to_string(), |v| format!("{v:.0}"));
    let bedrooms = listing.bedrooms.map_or_else(|| "?".to_string(), |b| b.to_string());

    let tooltip = format!(
        "${price}, {bedrooms}BDR ${per_sqft}/sqft, \
         {garage_status}{internet_status}{freshness} {price_trend} {note}"
    );

    let popup_html = popup_html(
        listing,
        &price,
        &per_sqft,
        &bedrooms,
        &price_trend,
        garage_status,
        note,
    );

    Some(Marker {
        latitude,
        longitude,
        tooltip,
        popup_html,
        icon,
        marker_color,
        icon_color,
    })
}

/// Formats the price-change indicator: a delta from the price history
/// when available, otherwise the bare price-change date.
fn price_trend(listing: &Listing, history: Option<&[PriceHistoryEntry]>) -> String {
    if let Some(entries) = history {
        if let [.., previous, latest] = entries {
            let delta = latest.price - previous.price;
            let arrow = if delta < 0 { "↓" } else { "↑" };
            return format!(
                "{arrow}${} since {}",
                delta.abs(),
                latest.recorded_at.format("%Y-%m-%d")
            );
        }
    }

    listing
        .price_change_date
        .map_or_else(String::new, |date| format!("🗠{}", date.format("%Y-%m-%d")))
}

fn icon_for(listing: &Listing, annotation: Option<&Annotation>) -> (&'static str, &'static str) {
    if let Some(annotation) = annotation {
        if annotation.keep {
            ("circle-check", "lightblue")
        } else {
            ("circle-xmark", "lightgray")
        }
    } else {
        match listing.building_type.as_deref() {
            Some("House") => ("house", "white"),
            Some("Apartment") => ("building", "white"),
            _ => ("city", "white"),
        }
    }
}

fn popup_html(
    listing: &Listing,
    price: &str,
    per_sqft: &str,
    bedrooms: &str,
    price_trend: &str,
    garage_status: &str,
    note: &str,
) -> String {
    let address = escape(listing.address.as_deref().unwrap_or("(no address)"));
    let bathrooms = listing.bathrooms.map_or_else(|| "?".to_string(), |b| b.to_string());
    let sqft = listing
        .computed_sqft
        .map_or_else(|| "?".to_string(), |v| format!("{v:.0}"));
    let building_type = escape(listing.building_type.as_deref().unwrap_or(""));
    let parking = escape(listing.parking.as_deref().unwrap_or("unknown"));
    let last_updated = listing
        .last_updated
        .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string());

    let photo = listing.photo_url.as_deref().map_or_else(String::new, |url| {
        format!("<img src=\"{}\" width=\"320\"><br>\n", escape(url))
    });
    let details = listing.details_url.as_deref().map_or_else(String::new, |url| {
        format!("<a href=\"{}\" target=\"_blank\">Details</a><br>\n", escape(url))
    });

    format!(
        "{photo}<b>${price}</b> ${per_sqft}/sqft {mls} {price_trend}<br>\n\
         {address}<br>\n\
         {bedrooms}BDR, {bathrooms}BA, {sqft}sqft, {building_type}<br>\n\
         {details}Last seen: {last_updated}<br>\n\
         Parking: {parking} {garage_status}<br>\n\
         {note}",
        mls = listing.mls_number,
        note = escape(note),
    )
}

/// Minimal HTML escaping for text interpolated into popup markup.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            id: 1,
            mls_number: 26_295_500,
            address: Some("100 Rue Main |#305|".to_string()),
            latitude: Some(45.5),
            longitude: Some(-73.6),
            price: Some(550_000),
            parking: Some("Attached Garage".to_string()),
            parking_spaces: Some(1),
            ownership_type: None,
            zoning_type: None,
            property_type: None,
            building_type: Some("House".to_string()),
            stories: Some(2),
            bedrooms: Some(3),
            bathrooms: Some(2),
            units_total: None,
            new_build: Some(false),
            size_interior: Some("1100 sqft".to_string()),
            computed_sqft: Some(1100.0),
            computed_price_per_sqft: Some(500.0),
            last_updated: NaiveDate::from_ymd_opt(2026, 3, 10),
            price_change_date: NaiveDate::from_ymd_opt(2026, 2, 1),
            photo_url: None,
            details_url: None,
            postal_code: None,
            remarks: None,
            open_house_at: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[test]
    fn listing_without_coordinates_gets_no_marker() {
        let mut listing = listing();
        listing.latitude = None;
        assert!(build_marker(&listing, None, None, today()).is_none());
    }

    #[test]
    fn garage_listing_gets_plain_parking_glyph() {
        let marker = build_marker(&listing(), None, None, today()).unwrap();
        assert!(marker.tooltip.contains("🅿️"));
        assert!(!marker.tooltip.contains("❓🅿️"));
        assert!(!marker.tooltip.contains("🤔🅿️"));
    }

    #[test]
    fn missing_parking_gets_question_glyph() {
        let mut listing = listing();
        listing.parking = None;
        let marker = build_marker(&listing, None, None, today()).unwrap();
        assert!(marker.tooltip.contains("❓🅿️"));
    }

    #[test]
    fn recent_update_is_marked_fresh() {
        let marker = build_marker(&listing(), None, None, today()).unwrap();
        assert!(marker.tooltip.contains("👶"));
    }

    #[test]
    fn stale_update_is_marked_old() {
        let mut listing = listing();
        listing.last_updated = NaiveDate::from_ymd_opt(2026, 1, 1);
        let marker = build_marker(&listing, None, None, today()).unwrap();
        assert!(marker.tooltip.contains("👴"));
    }

    #[test]
    fn history_delta_beats_bare_price_change_date() {
        let history = vec![
            PriceHistoryEntry {
                mls_number: 26_295_500,
                price: 575_000,
                recorded_at: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            },
            PriceHistoryEntry {
                mls_number: 26_295_500,
                price: 550_000,
                recorded_at: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            },
        ];
        let marker = build_marker(&listing(), None, Some(&history), today()).unwrap();
        assert!(marker.tooltip.contains("↓$25000 since 2026-02-01"));
    }

    #[test]
    fn single_entry_history_falls_back_to_price_change_date() {
        let history = vec![PriceHistoryEntry {
            mls_number: 26_295_500,
            price: 550_000,
            recorded_at: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        }];
        let marker = build_marker(&listing(), None, Some(&history), today()).unwrap();
        assert!(marker.tooltip.contains("🗠2026-02-01"));
    }

    #[test]
    fn discarded_annotation_grays_the_marker() {
        let annotation = Annotation {
            keep: false,
            note: Some("no".to_string()),
        };
        let marker = build_marker(&listing(), Some(&annotation), None, today()).unwrap();
        assert_eq!(marker.icon, "circle-xmark");
        assert_eq!(marker.marker_color, "lightgray");
    }

    #[test]
    fn building_type_drives_the_icon() {
        let marker = build_marker(&listing(), None, None, today()).unwrap();
        assert_eq!(marker.icon, "house");

        let mut apartment = listing();
        apartment.building_type = Some("Apartment".to_string());
        assert_eq!(
            build_marker(&apartment, None, None, today()).unwrap().icon,
            "building"
        );

        let mut other = listing();
        other.building_type = None;
        assert_eq!(build_marker(&other, None, None, today()).unwrap().icon, "city");
    }

    #[test]
    fn popup_escapes_markup_in_text_fields() {
        let mut listing = listing();
        listing.address = Some("<script>alert(1)</script>".to_string());
        let marker = build_marker(&listing, None, None, today()).unwrap();
        assert!(!marker.popup_html.contains("<script>"));
        assert!(marker.popup_html.contains("&lt;script&gt;"));
    }

    #[test]
    fn priced_marker_uses_the_ramp_color() {
        let marker = build_marker(&listing(), None, None, today()).unwrap();
        assert!(marker.icon_color.starts_with('#'));

        let mut unpriced = listing();
        unpriced.computed_price_per_sqft = None;
        assert_eq!(
            build_marker(&unpriced, None, None, today()).unwrap().icon_color,
            "blue"
        );
    }
}
