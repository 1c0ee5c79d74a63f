//! Great-circle and local flat-earth geometry.
//!
//! Distances and bearings use the haversine formulation on a spherical
//! earth of radius [`EARTH_RADIUS_M`], which is accurate to well within
//! consumer GPS precision.
//!
//! Entity motion instead uses a local flat-earth approximation: one degree
//! of latitude is [`METERS_PER_DEGREE_LAT`] meters and one degree of
//! longitude is that value scaled by `cos(latitude)`.
//!
//! # Known limitation
//!
//! The flat-earth conversion is only valid at event scale (a few
//! kilometers). Error grows with distance from the reference point and
//! the longitude scale collapses near the poles; offsets computed there
//! leave longitude unchanged.

use core::ops::{Add, Sub};

use fieldquest_types::GeoPoint;

use crate::error::WorldError;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude in the local flat-earth approximation.
pub const METERS_PER_DEGREE_LAT: f64 = 111_132.0;

/// Below this longitude scale (meters per degree) offsets ignore east-west motion.
const MIN_LNG_SCALE: f64 = 1e-6;

/// Validate a raw coordinate pair.
pub fn validated(lat: f64, lng: f64) -> Result<GeoPoint, WorldError> {
    let point = GeoPoint::new(lat, lng);
    if point.is_valid() {
        Ok(point)
    } else {
        Err(WorldError::InvalidCoordinate { lat, lng })
    }
}

/// Haversine distance between two points in meters.
///
/// Always non-negative for valid input; NaN input propagates.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi_a = a.lat.to_radians();
    let phi_b = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1].
    let h = h.clamp(0.0, 1.0);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * central_angle
}

/// Initial great-circle bearing from `from` to `to`, in degrees `[0, 360)`.
pub fn bearing_degrees(from: GeoPoint, to: GeoPoint) -> f64 {
    let phi_a = from.lat.to_radians();
    let phi_b = to.lat.to_radians();
    let d_lambda = (to.lng - from.lng).to_radians();

    let y = d_lambda.sin() * phi_b.cos();
    let x = phi_a.cos() * phi_b.sin() - phi_a.sin() * phi_b.cos() * d_lambda.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Smallest distance from `from` to any of `targets`, or `None` if empty.
pub fn nearest_distance<I>(from: GeoPoint, targets: I) -> Option<f64>
where
    I: IntoIterator<Item = GeoPoint>,
{
    targets
        .into_iter()
        .map(|target| distance_meters(from, target))
        .filter(|d| !d.is_nan())
        .min_by(f64::total_cmp)
}

/// A displacement in local meters (east, north).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalVector {
    /// Meters east (negative is west).
    pub east: f64,
    /// Meters north (negative is south).
    pub north: f64,
}

impl LocalVector {
    /// The zero vector.
    pub const ZERO: Self = Self {
        east: 0.0,
        north: 0.0,
    };

    /// Create a vector from components.
    pub const fn new(east: f64, north: f64) -> Self {
        Self { east, north }
    }

    /// Euclidean length in meters.
    pub fn length(self) -> f64 {
        self.east.hypot(self.north)
    }

    /// Unit vector in the same direction. A (near-)zero vector stays zero.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len.is_finite() && len > f64::EPSILON {
            Self::new(self.east / len, self.north / len)
        } else {
            Self::ZERO
        }
    }

    /// Multiply both components by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.east * factor, self.north * factor)
    }
}

impl Add for LocalVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.east + rhs.east, self.north + rhs.north)
    }
}

impl Sub for LocalVector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.east - rhs.east, self.north - rhs.north)
    }
}

/// Meters per degree of longitude at the given latitude.
fn meters_per_degree_lng(lat: f64) -> f64 {
    METERS_PER_DEGREE_LAT * lat.to_radians().cos()
}

/// Flat-earth displacement from `from` to `to`, referenced at `from`'s latitude.
pub fn local_offset(from: GeoPoint, to: GeoPoint) -> LocalVector {
    LocalVector::new(
        (to.lng - from.lng) * meters_per_degree_lng(from.lat),
        (to.lat - from.lat) * METERS_PER_DEGREE_LAT,
    )
}

/// Move `point` by a local displacement using the flat-earth approximation.
pub fn offset_by(point: GeoPoint, delta: LocalVector) -> GeoPoint {
    let lng_scale = meters_per_degree_lng(point.lat);
    let d_lng = if lng_scale.abs() > MIN_LNG_SCALE {
        delta.east / lng_scale
    } else {
        0.0
    };
    GeoPoint::new(
        point.lat + delta.north / METERS_PER_DEGREE_LAT,
        point.lng + d_lng,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STOCKHOLM: GeoPoint = GeoPoint::new(59.3293, 18.0686);

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let other = GeoPoint::new(59.3326, 18.0649);
        let ab = distance_meters(STOCKHOLM, other);
        let ba = distance_meters(other, STOCKHOLM);
        assert!((ab - ba).abs() < 1e-9);
        assert!(distance_meters(STOCKHOLM, STOCKHOLM).abs() < 1e-9);
    }

    #[test]
    fn city_scale_distance() {
        // Paris to London, roughly 343.5 km.
        let paris = GeoPoint::new(48.8566, 2.3522);
        let london = GeoPoint::new(51.5074, -0.1278);
        let d = distance_meters(paris, london);
        assert!((d - 343_500.0).abs() < 1_500.0, "got {d}");
    }

    #[test]
    fn nan_propagates() {
        let d = distance_meters(GeoPoint::new(f64::NAN, 0.0), STOCKHOLM);
        assert!(d.is_nan());
    }

    #[test]
    fn bearings_for_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        let north = bearing_degrees(origin, GeoPoint::new(1.0, 0.0));
        let east = bearing_degrees(origin, GeoPoint::new(0.0, 1.0));
        let west = bearing_degrees(origin, GeoPoint::new(0.0, -1.0));
        assert!(north.abs() < 1e-9);
        assert!((east - 90.0).abs() < 1e-9);
        assert!((west - 270.0).abs() < 1e-9);
    }

    #[test]
    fn flat_earth_offset_matches_haversine_at_event_scale() {
        let moved = offset_by(STOCKHOLM, LocalVector::new(60.0, 80.0));
        let d = distance_meters(STOCKHOLM, moved);
        assert!((d - 100.0).abs() < 0.5, "got {d}");

        let back = local_offset(STOCKHOLM, moved);
        assert!((back.east - 60.0).abs() < 1e-6);
        assert!((back.north - 80.0).abs() < 1e-6);
    }

    #[test]
    fn normalizing_zero_vector_stays_zero() {
        assert_eq!(LocalVector::ZERO.normalized(), LocalVector::ZERO);
        let unit = LocalVector::new(3.0, 4.0).normalized();
        assert!((unit.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn nearest_distance_picks_minimum() {
        let near = offset_by(STOCKHOLM, LocalVector::new(0.0, 10.0));
        let far = offset_by(STOCKHOLM, LocalVector::new(0.0, 500.0));
        let d = nearest_distance(STOCKHOLM, [far, near]).unwrap();
        assert!((d - 10.0).abs() < 0.1);
        assert!(nearest_distance(STOCKHOLM, std::iter::empty()).is_none());
    }

    #[test]
    fn validation_rejects_out_of_range() {
        assert!(validated(45.0, 10.0).is_ok());
        assert!(validated(-95.0, 10.0).is_err());
        assert!(validated(10.0, f64::INFINITY).is_err());
    }
}
