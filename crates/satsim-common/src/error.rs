//! Error types for the common crate.

use thiserror::Error;

/// Errors raised when parsing link identity values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommonError {
    /// The MAC address text could not be parsed.
    #[error("Invalid MAC address '{0}' (expected six colon-separated hex octets)")]
    InvalidMacAddress(String),

    /// The channel type name is not recognized.
    #[error("Unknown channel type '{0}'")]
    UnknownChannelType(String),
}
