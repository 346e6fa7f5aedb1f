//! Error types for configuration loading.

use satsim_fading::FadingError;
use satsim_frame::FrameError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML did not match the configuration schema.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Fading section failed validation.
    #[error("Invalid fading section: {0}")]
    Fading(#[from] FadingError),

    /// Frame section failed validation.
    #[error("Invalid frame section: {0}")]
    Frame(#[from] FrameError),

    /// Sections that are valid alone but inconsistent together.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
