//! Error types for scenario runs.

use satsim_common::TimelineError;
use satsim_fading::FadingError;
use satsim_frame::FrameError;
use satsim_model::ModelError;
use satsim_trace::TraceError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running a scenario or CLI command.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Model configuration error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Fading request failed.
    #[error("Fading error: {0}")]
    Fading(#[from] FadingError),

    /// Frame construction or filling failed.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Trace lookup failed.
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    /// Event could not be scheduled.
    #[error("Scheduling error: {0}")]
    Timeline(#[from] TimelineError),

    /// Scenario file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Scenario file did not match the schema.
    #[error("Scenario parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Scenario is well-formed but cannot run against the model.
    #[error("Invalid scenario: {0}")]
    Scenario(String),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Record serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
