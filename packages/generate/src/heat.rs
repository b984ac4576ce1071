//! Heat overlay data.

use property_map_listings_models::Listing;

/// Which listing figure weights the heat overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatWeight {
    /// Weight by asking price.
    Price,
    /// Weight by price per square foot.
    PricePerSqft,
}

/// Builds `[lat, lng, weight]` triples for the heat layer.
///
/// Listings missing coordinates or the chosen weight contribute nothing.
#[must_use]
pub fn heat_points(listings: &[Listing], weight: HeatWeight) -> Vec<[f64; 3]> {
    listings
        .iter()
        .filter_map(|listing| {
            let (lat, lng) = match (listing.latitude, listing.longitude) {
                (Some(lat), Some(lng)) => (lat, lng),
                _ => return None,
            };
            #[allow(clippy::cast_precision_loss)]
            let weight = match weight {
                HeatWeight::Price => listing.price? as f64,
                HeatWeight::PricePerSqft => listing.computed_price_per_sqft?,
            };
            Some([lat, lng, weight])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: i64, price: Option<i64>, per_sqft: Option<f64>) -> Listing {
        Listing {
            id,
            mls_number: id + 1000,
            address: None,
            latitude: Some(45.5),
            longitude: Some(-73.6),
            price,
            parking: None,
            parking_spaces: None,
            ownership_type: None,
            zoning_type: None,
            property_type: None,
            building_type: None,
            stories: None,
            bedrooms: None,
            bathrooms: None,
            units_total: None,
            new_build: None,
            size_interior: None,
            computed_sqft: None,
            computed_price_per_sqft: per_sqft,
            last_updated: None,
            price_change_date: None,
            photo_url: None,
            details_url: None,
            postal_code: None,
            remarks: None,
            open_house_at: None,
        }
    }

    #[test]
    fn weights_by_price() {
        let listings = vec![listing(1, Some(500_000), None)];
        let points = heat_points(&listings, HeatWeight::Price);
        assert_eq!(points, vec![[45.5, -73.6, 500_000.0]]);
    }

    #[test]
    fn skips_listings_missing_the_chosen_weight() {
        let listings = vec![
            listing(1, Some(500_000), None),
            listing(2, None, Some(450.0)),
        ];
        assert_eq!(heat_points(&listings, HeatWeight::Price).len(), 1);
        assert_eq!(heat_points(&listings, HeatWeight::PricePerSqft).len(), 1);
    }

    #[test]
    fn skips_listings_without_coordinates() {
        let mut uncharted = listing(1, Some(500_000), None);
        uncharted.latitude = None;
        assert!(heat_points(&[uncharted], HeatWeight::Price).is_empty());
    }
}
