//! Geo math, trigger zones, and weather for the FieldQuest adventure engine.
//!
//! This crate models the physical surroundings of a session: distances
//! and bearings between GPS coordinates, the flat-earth conversion used to
//! integrate entity motion, circular trigger zones, and the whiteout
//! weather cycle.
//!
//! # Modules
//!
//! - [`error`] -- Error types for coordinate and weather configuration.
//! - [`geo`] -- Haversine distance, bearing, and local flat-earth offsets.
//! - [`timing`] -- Seconds to [`chrono::TimeDelta`] conversions.
//! - [`weather`] -- Deadline-driven whiteout cycle ([`WhiteoutCycle`]).
//! - [`zone`] -- Circular containment zones ([`Zone`]).

pub mod error;
pub mod geo;
pub mod timing;
pub mod weather;
pub mod zone;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use geo::{
    EARTH_RADIUS_M, LocalVector, METERS_PER_DEGREE_LAT, bearing_degrees, distance_meters,
    local_offset, nearest_distance, offset_by,
};
pub use timing::{deadline_after, delta_seconds, seconds_between, seconds_to_delta};
pub use weather::{WeatherConfig, WhiteoutChange, WhiteoutCycle};
pub use zone::{Zone, inside_any};
