//! Error types for the fieldquest-entities crate.
//!
//! Controllers never fail once constructed; the only error surface is
//! configuration validation at mode start.

/// Errors that can occur while setting up entity controllers.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// A motion or survival parameter is out of range.
    #[error("invalid entity configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}
