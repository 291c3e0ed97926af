//! Riffle error types

use thiserror::Error;

/// Errors from configuration and surface lookups
///
/// The scroll hot path never returns these: contract violations there are
/// logged and ignored.
#[derive(Error, Debug)]
pub enum RiffleError {
    /// The surface was dropped before the operation could run
    #[error("Surface is no longer alive")]
    SurfaceGone,

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),
}

/// Result type for Riffle operations
pub type Result<T> = std::result::Result<T, RiffleError>;
