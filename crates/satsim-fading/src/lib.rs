//! # satsim-fading
//!
//! Elevation and velocity dependent fading for satellite links.
//!
//! Each link runs a small Markov chain over fading states (clear line of
//! sight, shadowed, blocked, ...). Chain parameters are anchored at a few
//! elevation angles and blended linearly in between. Time spent in a state
//! is measured in dwell progress, which accrues faster for fast-moving
//! terminals. The fading sample for the current state comes from a
//! sum-of-sinusoids fader (Rayleigh or Loo) whose parameters are supplied by
//! a [`ParameterProvider`].
//!
//! [`MarkovContainer`] is the entry point: it owns one [`MarkovModel`] per
//! [`LinkKey`](satsim_common::LinkKey), or serves recorded traces instead.
//!
//! ## Modules
//!
//! - [`conf`] - bucket table, dwell and velocity scaling
//! - [`provider`] - fader parameter tables
//! - [`fader`] - oscillator-bank faders
//! - [`model`] - per-link chain
//! - [`container`] - per-link facade

pub mod conf;
pub mod container;
mod error;
pub mod fader;
pub mod model;
pub mod provider;

pub use conf::{BucketResolution, ElevationBucket, MarkovConf, VelocityScaling};
pub use container::{FadingInputs, FadingMode, MarkovContainer};
pub use error::FadingError;
pub use fader::{Fader, MAX_OSCILLATORS, MIN_FADING_DB};
pub use model::{LinkFadingState, MarkovModel};
pub use provider::{FaderConf, FaderFamily, LooConf, ParameterProvider, RayleighConf};

/// Result type for fading operations.
pub type Result<T> = std::result::Result<T, FadingError>;
