//! Boundary to the external geometry service.
//!
//! Polygon math (area, intersection, centroid, distance) is owned by the
//! host. The core only consumes it through [`GeometryService`] and treats every
//! call as fallible: a failed query degrades the operation that needed it
//! (no location, no defense bonus, no claim target) and never aborts a tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A closed ring of points drawn by the player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<GeoPoint>,
}

impl Polygon {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("geometry query returned no result")]
    Empty,
    #[error("unknown shape for country {0}")]
    UnknownShape(String),
    #[error("geometry service failed: {0}")]
    Failed(String),
}

/// Spatial queries consumed by the core.
pub trait GeometryService {
    /// Area of a polygon in km².
    fn area_km2(&self, polygon: &Polygon) -> Result<f64, GeometryError>;

    /// Area of the overlap between a polygon and a country's territory, in km².
    fn intersection_km2(&self, polygon: &Polygon, country: &str) -> Result<f64, GeometryError>;

    /// Total land area of a country in km².
    fn country_area_km2(&self, country: &str) -> Result<f64, GeometryError>;

    fn centroid(&self, polygon: &Polygon) -> Result<GeoPoint, GeometryError>;

    /// A representative point on the front between two countries.
    fn frontline(&self, attacker: &str, defender: &str) -> Result<GeoPoint, GeometryError>;

    /// Great-circle distance in km.
    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> Result<f64, GeometryError>;
}
