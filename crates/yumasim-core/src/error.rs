// crates/yumasim-core/src/error.rs

use thiserror::Error;

/// Workspace-wide error types for the Yuma simulator.
///
/// Numerical degeneracy (all-zero rows, zero stake) is never an error; it is
/// resolved to zero where it occurs. Everything here is raised before an
/// epoch is computed.
#[derive(Debug, Error)]
pub enum YumaError {
    /// Unrecognized Yuma version name.
    #[error("Unknown Yuma version: {0}")]
    UnknownVersion(String),

    /// Case name not present in the registry.
    #[error("Unknown case: {0}")]
    UnknownCase(String),

    /// Matrix/vector shapes do not agree.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Parameters or case contents outside their valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading case or configuration files failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for YumaError {
    fn from(e: serde_json::Error) -> Self {
        YumaError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for YumaError {
    fn from(e: std::io::Error) -> Self {
        YumaError::Io(e.to_string())
    }
}
