//! Error types for the `fieldquest-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

/// Errors that can occur in geo and weather operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A coordinate is non-finite or outside the WGS84 range.
    #[error("invalid coordinate: lat {lat}, lng {lng}")]
    InvalidCoordinate {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },

    /// A configuration value is out of range.
    #[error("invalid world configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong.
        reason: String,
    },
}
