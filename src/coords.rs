use std::fmt;

use geo::{GeodesicDistance, Point};

/// WGS84 position in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    // geo wants x = longitude, y = latitude
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }

    /// Geodesic distance on the WGS84 ellipsoid, in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        self.point().geodesic_distance(&other.point()) / 1000.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}
