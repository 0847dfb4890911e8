//! Coordinate and viewport primitives.

use geo::{HaversineDistance, Point as GeoPoint};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(self, other: LatLng) -> f64 {
        GeoPoint::new(self.lng, self.lat).haversine_distance(&GeoPoint::new(other.lng, other.lat))
    }

    /// Exact bitwise key, used wherever "identical coordinate" is the
    /// contract rather than approximate equality.
    pub(crate) fn bits(self) -> (u64, u64) {
        (self.lat.to_bits(), self.lng.to_bits())
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// An axis-aligned viewport rectangle in degrees.
///
/// Containment does not wrap across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// The whole world; useful as a null viewport.
    pub const fn world() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    /// Whether `coord` lies inside this rectangle (edges inclusive).
    pub fn contains(&self, coord: LatLng) -> bool {
        coord.lat >= self.south
            && coord.lat <= self.north
            && coord.lng >= self.west
            && coord.lng <= self.east
    }
}
