//! A point-and-area geometry service for headless runs.
//!
//! Every nation is a centre point plus a land area. That is enough for
//! distances, frontlines and rough claim overlaps without shipping real
//! border polygons.

use geosim_core::{GeoPoint, GeometryError, GeometryService, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Where a nation sits and how big it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryShape {
    pub code: String,
    pub center: GeoPoint,
    pub area_km2: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PointGeometry {
    shapes: BTreeMap<String, CountryShape>,
}

impl PointGeometry {
    pub fn new(shapes: impl IntoIterator<Item = CountryShape>) -> Self {
        Self {
            shapes: shapes.into_iter().map(|s| (s.code.clone(), s)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn shape(&self, code: &str) -> Result<&CountryShape, GeometryError> {
        self.shapes
            .get(code)
            .ok_or_else(|| GeometryError::UnknownShape(code.to_string()))
    }
}

/// Great-circle distance between two points (haversine).
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Ray casting in lat/lon space. Good enough away from the poles and the
/// antimeridian.
fn contains(polygon: &Polygon, point: GeoPoint) -> bool {
    let pts = &polygon.points;
    let mut inside = false;
    let mut j = pts.len().wrapping_sub(1);
    for i in 0..pts.len() {
        let (pi, pj) = (pts[i], pts[j]);
        if (pi.lat > point.lat) != (pj.lat > point.lat) {
            let lon_at = pi.lon + (point.lat - pi.lat) / (pj.lat - pi.lat) * (pj.lon - pi.lon);
            if point.lon < lon_at {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

impl GeometryService for PointGeometry {
    /// Shoelace area on an equirectangular projection about the mean latitude.
    fn area_km2(&self, polygon: &Polygon) -> Result<f64, GeometryError> {
        let pts = &polygon.points;
        if pts.len() < 3 {
            return Err(GeometryError::Empty);
        }
        let mean_lat = pts.iter().map(|p| p.lat).sum::<f64>() / pts.len() as f64;
        let scale = mean_lat.to_radians().cos();
        let project = |p: &GeoPoint| {
            (
                p.lon.to_radians() * scale * EARTH_RADIUS_KM,
                p.lat.to_radians() * EARTH_RADIUS_KM,
            )
        };

        let mut twice_area = 0.0;
        for (i, p) in pts.iter().enumerate() {
            let (x1, y1) = project(p);
            let (x2, y2) = project(&pts[(i + 1) % pts.len()]);
            twice_area += x1 * y2 - x2 * y1;
        }
        Ok(twice_area.abs() / 2.0)
    }

    /// The whole polygon counts against a country whose centre it covers,
    /// up to the country's area. Countries it does not cover get nothing.
    fn intersection_km2(&self, polygon: &Polygon, country: &str) -> Result<f64, GeometryError> {
        let shape = self.shape(country)?;
        if !contains(polygon, shape.center) {
            return Ok(0.0);
        }
        Ok(self.area_km2(polygon)?.min(shape.area_km2))
    }

    fn country_area_km2(&self, country: &str) -> Result<f64, GeometryError> {
        Ok(self.shape(country)?.area_km2)
    }

    fn centroid(&self, polygon: &Polygon) -> Result<GeoPoint, GeometryError> {
        let n = polygon.points.len();
        if n == 0 {
            return Err(GeometryError::Empty);
        }
        let (lat, lon) = polygon
            .points
            .iter()
            .fold((0.0, 0.0), |(la, lo), p| (la + p.lat, lo + p.lon));
        Ok(GeoPoint::new(lat / n as f64, lon / n as f64))
    }

    /// Midway between the two centres.
    fn frontline(&self, attacker: &str, defender: &str) -> Result<GeoPoint, GeometryError> {
        let a = self.shape(attacker)?.center;
        let d = self.shape(defender)?.center;
        Ok(GeoPoint::new((a.lat + d.lat) / 2.0, (a.lon + d.lon) / 2.0))
    }

    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> Result<f64, GeometryError> {
        Ok(haversine_km(a, b))
    }
}
