//! # satsim-model
//!
//! YAML configuration for the satellite link simulator.
//!
//! Every section is optional; omitted sections fall back to the built-in
//! four-bucket Loo model and a DVB-S2 frame table at 25 Mbaud.
//!
//! ```yaml
//! seed: 42
//! fading:
//!   mode: markov            # or: trace
//!   initial_state: 0
//!   min_dwell_s: 0.01
//!   velocity:
//!     reference_velocity_mps: 10.0
//!     min_velocity_mps: 1.0
//!   buckets:
//!     - elevation_deg: 30
//!       transitions: [[0.9, 0.1], [0.2, 0.8]]
//!       mean_dwell_s: [2.0, 0.5]
//!     - elevation_deg: 70
//!       transitions: [[0.95, 0.05], [0.3, 0.7]]
//!       mean_dwell_s: [3.0, 0.4]
//!   fader:
//!     family: rayleigh
//!     parameters:
//!       - [[10, 30], [10, 60]]
//!       - [[12, 30], [12, 60]]
//! frame:
//!   symbol_rate_baud: 25.0e6
//!   pilots: true
//! trace:
//!   root: sim_root
//!   wrap_around: false
//! ```

mod config;
mod error;

pub use config::{FadingSection, FrameSection, FrameTableEntry, Model, SimConfig};
pub use error::ModelError;

/// Result type for model loading.
pub type Result<T> = std::result::Result<T, ModelError>;
