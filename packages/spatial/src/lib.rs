#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geometric filters for the property map.
//!
//! [`AreaOfInterest`] wraps the user's polygon for point-in-polygon
//! membership tests (boundary points count as contained). [`TransitIndex`]
//! holds transit stops in an R-tree; candidate stops come from a
//! degree-envelope query sized from the meter threshold and are confirmed
//! with geodesic (WGS84 ellipsoidal) distance, never planar Euclidean.
//!
//! Both load from `GeoJSON` files when configured. A missing optional file
//! is the caller's concern — constructors here only ever see real inputs.

use std::path::Path;

use geo::{Coord, Distance, Geodesic, Intersects, LineString, Point, Polygon};
use geojson::GeoJson;
use rstar::{AABB, RTree};

/// Meters per degree of latitude, rounded down for envelope padding.
const METERS_PER_DEGREE: f64 = 110_000.0;

/// Extra margin on the candidate envelope so the geodesic check is the
/// only thing that decides inclusion.
const ENVELOPE_MARGIN: f64 = 1.5;

/// Errors from loading or constructing geometry.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// I/O error reading a `GeoJSON` file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// `GeoJSON` parse error.
    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),

    /// The file parsed but contained no polygon geometry.
    #[error("No polygon geometry in {0}")]
    NoPolygon(String),

    /// A polygon needs at least three vertices.
    #[error("Degenerate polygon: {0} vertices")]
    DegeneratePolygon(usize),
}

/// The user's area-of-interest polygon.
///
/// Vertices are (latitude, longitude) pairs; the polygon is closed
/// implicitly. Assumed simple (non-self-intersecting) per the dataset
/// contract.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    polygon: Polygon<f64>,
}

impl AreaOfInterest {
    /// Builds an area of interest from (latitude, longitude) vertices.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::DegeneratePolygon`] for fewer than three
    /// vertices.
    pub fn new(vertices: &[(f64, f64)]) -> Result<Self, SpatialError> {
        if vertices.len() < 3 {
            return Err(SpatialError::DegeneratePolygon(vertices.len()));
        }

        let exterior: Vec<Coord<f64>> = vertices
            .iter()
            .map(|&(lat, lng)| Coord { x: lng, y: lat })
            .collect();

        Ok(Self {
            polygon: Polygon::new(LineString::new(exterior), vec![]),
        })
    }

    /// Loads the polygon from a `GeoJSON` file (geometry, feature, or
    /// feature collection; first polygon wins).
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read or parsed, or
    /// contains no polygon.
    pub fn from_geojson_file(path: &Path) -> Result<Self, SpatialError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SpatialError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let geojson: GeoJson = raw.parse()?;
        let polygon = first_polygon(&geojson)
            .ok_or_else(|| SpatialError::NoPolygon(path.display().to_string()))?;

        log::info!(
            "Loaded area of interest ({} vertices) from {}",
            polygon.exterior().0.len(),
            path.display()
        );

        Ok(Self { polygon })
    }

    /// Whether the point lies inside the polygon. Points exactly on the
    /// boundary count as contained, which `Intersects` gives us and
    /// `Contains` would not.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.polygon.intersects(&Point::new(longitude, latitude))
    }

    /// Exterior vertices as (latitude, longitude) pairs, for rendering.
    #[must_use]
    pub fn vertices(&self) -> Vec<(f64, f64)> {
        self.polygon
            .exterior()
            .0
            .iter()
            .map(|c| (c.y, c.x))
            .collect()
    }
}

/// Transit stops in an R-tree, queried by geodesic proximity.
#[derive(Debug, Clone)]
pub struct TransitIndex {
    /// Stop coordinates as `[longitude, latitude]`.
    tree: RTree<[f64; 2]>,
}

impl TransitIndex {
    /// Builds the index from (latitude, longitude) stop coordinates.
    #[must_use]
    pub fn new(stops: &[(f64, f64)]) -> Self {
        let points: Vec<[f64; 2]> = stops.iter().map(|&(lat, lng)| [lng, lat]).collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Loads stops from a `GeoJSON` file of point features.
    ///
    /// Non-point geometries are skipped with a warning; an empty file
    /// yields an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read or parsed.
    pub fn from_geojson_file(path: &Path) -> Result<Self, SpatialError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SpatialError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let geojson: GeoJson = raw.parse()?;
        let mut points = Vec::new();
        let mut skipped = 0usize;

        for geometry in geometries(&geojson) {
            match geo::Geometry::<f64>::try_from(geometry.clone()) {
                Ok(geo::Geometry::Point(p)) => points.push([p.x(), p.y()]),
                Ok(_) | Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} non-point features in {}", path.display());
        }
        log::info!("Loaded {} transit stops from {}", points.len(), path.display());

        Ok(Self {
            tree: RTree::bulk_load(points),
        })
    }

    /// Whether any stop lies strictly within `meters` of the point.
    ///
    /// The R-tree narrows candidates with a padded degree envelope; the
    /// geodesic distance makes the decision.
    #[must_use]
    pub fn any_within(&self, latitude: f64, longitude: f64, meters: f64) -> bool {
        let dlat = meters * ENVELOPE_MARGIN / METERS_PER_DEGREE;
        let cos_lat = latitude.to_radians().cos().abs().max(0.01);
        let dlng = dlat / cos_lat;

        let envelope = AABB::from_corners(
            [longitude - dlng, latitude - dlat],
            [longitude + dlng, latitude + dlat],
        );

        let origin = Point::new(longitude, latitude);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .any(|stop| Geodesic.distance(origin, Point::new(stop[0], stop[1])) < meters)
    }

    /// Stop coordinates as (latitude, longitude) pairs, for rendering.
    #[must_use]
    pub fn stops(&self) -> Vec<(f64, f64)> {
        self.tree.iter().map(|s| (s[1], s[0])).collect()
    }

    /// Number of stops in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no stops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Flattens any `GeoJSON` document shape into its geometry values.
fn geometries(geojson: &GeoJson) -> Vec<&geojson::Geometry> {
    match geojson {
        GeoJson::Geometry(g) => vec![g],
        GeoJson::Feature(f) => f.geometry.iter().collect(),
        GeoJson::FeatureCollection(fc) => {
            fc.features.iter().filter_map(|f| f.geometry.as_ref()).collect()
        }
    }
}

/// Finds the first polygon in a `GeoJSON` document. A `MultiPolygon`
/// contributes its first member.
fn first_polygon(geojson: &GeoJson) -> Option<Polygon<f64>> {
    for geometry in geometries(geojson) {
        match geo::Geometry::<f64>::try_from(geometry.clone()) {
            Ok(geo::Geometry::Polygon(p)) => return Some(p),
            Ok(geo::Geometry::MultiPolygon(mp)) => return mp.0.into_iter().next(),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> AreaOfInterest {
        AreaOfInterest::new(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).unwrap()
    }

    #[test]
    fn interior_point_is_contained() {
        assert!(unit_square().contains(0.5, 0.5));
    }

    #[test]
    fn exterior_point_is_not_contained() {
        assert!(!unit_square().contains(2.0, 2.0));
    }

    #[test]
    fn boundary_point_counts_as_contained() {
        assert!(unit_square().contains(0.0, 0.5));
        assert!(unit_square().contains(1.0, 1.0));
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let err = AreaOfInterest::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, SpatialError::DegeneratePolygon(2)));
    }

    #[test]
    fn vertices_round_trip_latitude_first() {
        let aoi = AreaOfInterest::new(&[(45.5, -73.6), (45.6, -73.6), (45.6, -73.5)]).unwrap();
        assert_eq!(aoi.vertices()[0], (45.5, -73.6));
    }

    #[test]
    fn nearby_stop_is_within_threshold() {
        let index = TransitIndex::new(&[(0.0, 0.0), (10.0, 10.0)]);
        // (0.001, 0.001) is roughly 157 m from the origin stop.
        assert!(index.any_within(0.001, 0.001, 500.0));
    }

    #[test]
    fn distant_point_is_not_within_threshold() {
        let index = TransitIndex::new(&[(0.0, 0.0), (10.0, 10.0)]);
        assert!(!index.any_within(5.0, 5.0, 500.0));
    }

    #[test]
    fn proximity_is_strict() {
        let index = TransitIndex::new(&[(0.0, 0.0)]);
        let distance = Geodesic.distance(Point::new(0.0, 0.0), Point::new(0.001, 0.001));
        assert!(!index.any_within(0.001, 0.001, distance));
        assert!(index.any_within(0.001, 0.001, distance + 1.0));
    }

    #[test]
    fn empty_index_matches_nothing() {
        let index = TransitIndex::new(&[]);
        assert!(index.is_empty());
        assert!(!index.any_within(0.0, 0.0, 1_000_000.0));
    }

    #[test]
    fn stops_round_trip_latitude_first() {
        let index = TransitIndex::new(&[(45.5, -73.6)]);
        assert_eq!(index.stops(), vec![(45.5, -73.6)]);
    }

    #[test]
    fn loads_stops_from_feature_collection() {
        let tmp = std::env::temp_dir().join("property_map_spatial_stations_test.geojson");
        std::fs::write(
            &tmp,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"name":"A"},
                 "geometry":{"type":"Point","coordinates":[-73.6,45.5]}},
                {"type":"Feature","properties":{"name":"B"},
                 "geometry":{"type":"Point","coordinates":[-73.55,45.52]}}
            ]}"#,
        )
        .unwrap();

        let index = TransitIndex::from_geojson_file(&tmp).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.any_within(45.5001, -73.6001, 500.0));

        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn loads_polygon_from_feature() {
        let tmp = std::env::temp_dir().join("property_map_spatial_aoi_test.geojson");
        std::fs::write(
            &tmp,
            r#"{"type":"Feature","properties":{},
                "geometry":{"type":"Polygon","coordinates":
                    [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]}}"#,
        )
        .unwrap();

        let aoi = AreaOfInterest::from_geojson_file(&tmp).unwrap();
        assert!(aoi.contains(0.5, 0.5));
        assert!(!aoi.contains(2.0, 2.0));

        let _ = std::fs::remove_file(&tmp);
    }
}
