//! Leaflet map document assembly.
//!
//! Produces one self-contained HTML file: base tile layers, the
//! area-of-interest polygon, transit stops, listing markers, and the
//! optional heat overlay. Listing data is embedded as JSON; the page
//! needs nothing beyond CDN assets.

use serde_json::json;

use crate::markers::Marker;

/// Page skeleton with `__PLACEHOLDER__` slots filled by [`render_map`].
const TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Property Map</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.2/css/all.min.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.awesome-markers@2.0.5/dist/leaflet.awesome-markers.css">
<script src="https://unpkg.com/leaflet.awesome-markers@2.0.5/dist/leaflet.awesome-markers.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>
html, body { margin: 0; height: 100%; }
#map { height: 100%; }
</style>
</head>
<body>
<div id="map"></div>
<script>
const map = L.map('map').setView(__CENTER__, __ZOOM__);

const baseLayers = {};
const osm = L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
  attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
}).addTo(map);
baseLayers['OpenStreetMap'] = osm;
__TRANSPORT_LAYER__

const overlays = {};
__AREA_OF_INTEREST__
__TRANSIT_STOPS__

const listings = __MARKERS__;
const listingLayer = L.layerGroup();
for (const m of listings) {
  L.marker([m.lat, m.lng], {
    icon: L.AwesomeMarkers.icon({
      icon: m.icon,
      prefix: 'fa',
      markerColor: m.markerColor,
      iconColor: m.iconColor
    })
  }).bindTooltip(m.tooltip).bindPopup(m.popup, {maxWidth: 360}).addTo(listingLayer);
}
listingLayer.addTo(map);
overlays['Listings'] = listingLayer;
__HEAT_LAYER__

L.control.layers(baseLayers, overlays).addTo(map);
</script>
</body>
</html>
"##;

/// Map viewport settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Center as (latitude, longitude).
    pub center: (f64, f64),
    /// Initial zoom level.
    pub zoom: u8,
}

/// Renders the full map document.
///
/// `area_of_interest` and `transit_stops` are (latitude, longitude)
/// sequences; `heat_points` are `[lat, lng, weight]` triples. Optional
/// sections collapse to nothing when absent.
#[must_use]
pub fn render_map(
    viewport: Viewport,
    markers: &[Marker],
    area_of_interest: Option<&[(f64, f64)]>,
    transit_stops: Option<&[(f64, f64)]>,
    heat_points: Option<&[[f64; 3]]>,
    transport_tile_key: Option<&str>,
) -> String {
    let marker_values: Vec<serde_json::Value> = markers
        .iter()
        .map(|m| {
            json!({
                "lat": m.latitude,
                "lng": m.longitude,
                "tooltip": m.tooltip,
                "popup": m.popup_html,
                "icon": m.icon,
                "markerColor": m.marker_color,
                "iconColor": m.icon_color,
            })
        })
        .collect();

    let transport_layer = transport_tile_key.map_or_else(String::new, |key| {
        format!(
            "baseLayers['Thunderforest Transport'] = L.tileLayer(\n\
             'https://tile.thunderforest.com/transport/{{z}}/{{x}}/{{y}}.png?apikey={key}',\n\
             {{attribution: '&copy; <a href=\"https://www.thunderforest.com/\">Thunderforest</a>'}});"
        )
    });

    let area_block = area_of_interest.map_or_else(String::new, |vertices| {
        let coords = latlng_json(vertices);
        format!(
            "const areaOfInterest = L.polygon({coords});\n\
             areaOfInterest.bindTooltip('Area of Interest');\n\
             areaOfInterest.addTo(map);\n\
             overlays['Area of Interest'] = areaOfInterest;"
        )
    });

    let stops_block = transit_stops.map_or_else(String::new, |stops| {
        let coords = latlng_json(stops);
        format!(
            "const transitStops = L.layerGroup(\n\
             {coords}.map(s => L.circleMarker(s, {{radius: 4, color: '#444'}})));\n\
             overlays['Transit Stops'] = transitStops;"
        )
    });

    let heat_block = heat_points.map_or_else(String::new, |points| {
        let data = serde_json::to_string(points).unwrap_or_else(|_| "[]".to_string());
        format!(
            "const heat = L.heatLayer({data}, {{radius: 15}});\n\
             overlays['Heat'] = heat;"
        )
    });

    TEMPLATE
        .replace(
            "__CENTER__",
            &format!("[{}, {}]", viewport.center.0, viewport.center.1),
        )
        .replace("__ZOOM__", &viewport.zoom.to_string())
        .replace("__TRANSPORT_LAYER__", &transport_layer)
        .replace("__AREA_OF_INTEREST__", &area_block)
        .replace("__TRANSIT_STOPS__", &stops_block)
        .replace(
            "__MARKERS__",
            &serde_json::to_string(&marker_values).unwrap_or_else(|_| "[]".to_string()),
        )
        .replace("__HEAT_LAYER__", &heat_block)
}

fn latlng_json(points: &[(f64, f64)]) -> String {
    let pairs: Vec<[f64; 2]> = points.iter().map(|&(lat, lng)| [lat, lng]).collect();
    serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            center: (45.5037, -73.6254),
            zoom: 14,
        }
    }

    fn marker() -> Marker {
        Marker {
            latitude: 45.5,
            longitude: -73.6,
            tooltip: "$550000, 3BDR".to_string(),
            popup_html: "<b>$550000</b>".to_string(),
            icon: "house",
            marker_color: "white",
            icon_color: "#48b700".to_string(),
        }
    }

    #[test]
    fn renders_a_complete_document() {
        let html = render_map(viewport(), &[marker()], None, None, None, None);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("[45.5037, -73.6254], 14"));
        assert!(html.contains("$550000, 3BDR"));
        assert!(!html.contains("__MARKERS__"));
        assert!(!html.contains("__HEAT_LAYER__"));
    }

    #[test]
    fn optional_sections_collapse_when_absent() {
        let html = render_map(viewport(), &[], None, None, None, None);
        assert!(!html.contains("Area of Interest"));
        assert!(!html.contains("Transit Stops"));
        assert!(!html.contains("heatLayer"));
        assert!(!html.contains("thunderforest"));
    }

    #[test]
    fn polygon_and_stops_render_when_provided() {
        let aoi = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
        let stops = [(45.5, -73.6)];
        let html = render_map(viewport(), &[], Some(&aoi), Some(&stops), None, None);
        assert!(html.contains("L.polygon"));
        assert!(html.contains("Area of Interest"));
        assert!(html.contains("circleMarker"));
    }

    #[test]
    fn heat_layer_embeds_weighted_points() {
        let points = [[45.5, -73.6, 500_000.0]];
        let html = render_map(viewport(), &[], None, None, Some(&points), None);
        assert!(html.contains("L.heatLayer"));
        assert!(html.contains("500000"));
    }

    #[test]
    fn transport_layer_requires_a_key() {
        let html = render_map(viewport(), &[], None, None, None, Some("abc123"));
        assert!(html.contains("thunderforest.com"));
        assert!(html.contains("apikey=abc123"));
    }
}
