//! # satsim-runner
//!
//! Scenario runner for the satellite link simulator.
//!
//! - [`ScenarioRunner`] - Schedules a [`Scenario`] on the event timeline and
//!   collects [`SampleRecord`]s
//! - [`fill_frames`] - Packs fixed-size packets into one frame per MODCOD
//!
//! The `satsim` binary wraps both behind a command line.

mod error;
pub mod frames;
pub mod scenario;

pub use error::RunnerError;
pub use frames::{fill_frames, FrameFill};
pub use scenario::{SampleRecord, Scenario, ScenarioEvent, ScenarioRunner};

// Re-export for convenience
pub use satsim_common::SimTime;

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
