//! Error types for the fading crate.

use satsim_trace::TraceError;
use thiserror::Error;

/// Errors that can occur when configuring or querying the fading model.
#[derive(Debug, Error)]
pub enum FadingError {
    /// The configuration is internally inconsistent.
    #[error("Invalid fading configuration: {0}")]
    Configuration(String),

    /// A bucket index outside the configured table was requested.
    #[error("Elevation bucket {index} out of range ({count} buckets configured)")]
    BucketOutOfRange {
        /// Requested bucket.
        index: usize,
        /// Number of configured buckets.
        count: usize,
    },

    /// A state index outside the configured table was requested.
    #[error("Fading state {state} out of range ({count} states configured)")]
    StateOutOfRange {
        /// Requested state.
        state: usize,
        /// Number of configured states.
        count: usize,
    },

    /// An elevation or velocity query returned a non-finite value.
    #[error("Non-finite {input} input: {value}")]
    InvalidInput {
        /// Which input was bad.
        input: &'static str,
        /// The value returned.
        value: f64,
    },

    /// Trace-driven lookup failed.
    #[error(transparent)]
    Trace(#[from] TraceError),
}

impl FadingError {
    /// Whether this error stems from configuration rather than runtime data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FadingError::Configuration(_)
                | FadingError::BucketOutOfRange { .. }
                | FadingError::StateOutOfRange { .. }
        )
    }
}
