//! Circular trigger zones.
//!
//! Heat sources, threat markers, and checkpoints are all "within N meters
//! of a point" tests; a [`Zone`] is that test.

use fieldquest_types::GeoPoint;

use crate::geo::distance_meters;

/// A circle on the earth's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    /// Center of the zone.
    pub center: GeoPoint,
    /// Radius in meters. Containment is inclusive.
    pub radius_m: f64,
}

impl Zone {
    /// Create a zone.
    pub const fn new(center: GeoPoint, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// Distance from `point` to the zone center in meters.
    pub fn distance_to(&self, point: GeoPoint) -> f64 {
        distance_meters(self.center, point)
    }

    /// Whether `point` lies inside or on the edge of the zone.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.distance_to(point) <= self.radius_m
    }
}

/// Whether `point` lies inside any of `zones`.
pub fn inside_any(zones: &[Zone], point: GeoPoint) -> bool {
    zones.iter().any(|zone| zone.contains(point))
}
