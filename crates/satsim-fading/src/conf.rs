//! Markov chain configuration: elevation buckets, dwell times and velocity scaling.

use crate::provider::{FaderConf, ParameterProvider};
use crate::{FadingError, Result};
use serde::{Deserialize, Serialize};

/// Tolerance on transition row sums.
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Markov parameters anchored at one elevation angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElevationBucket {
    /// Anchor elevation in degrees.
    pub elevation_deg: f64,
    /// Row-stochastic matrix: `transitions[from][to]`.
    pub transitions: Vec<Vec<f64>>,
    /// Mean dwell per state, in reference seconds.
    pub mean_dwell_s: Vec<f64>,
}

/// How terminal velocity speeds up state changes.
///
/// Dwell times are expressed at `reference_velocity_mps`. A terminal moving
/// at `v` consumes dwell `max(v, min_velocity_mps) / reference_velocity_mps`
/// times faster, so a stationary terminal still changes state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VelocityScaling {
    /// Velocity at which dwell times hold as configured (m/s).
    pub reference_velocity_mps: f64,
    /// Velocities below this are treated as this (m/s).
    pub min_velocity_mps: f64,
}

impl Default for VelocityScaling {
    fn default() -> Self {
        Self {
            reference_velocity_mps: 10.0,
            min_velocity_mps: 1.0,
        }
    }
}

impl VelocityScaling {
    /// Dwell consumed per second of simulation time at `velocity_mps`.
    pub fn rate(&self, velocity_mps: f64) -> f64 {
        velocity_mps.abs().max(self.min_velocity_mps) / self.reference_velocity_mps
    }
}

/// Where an elevation falls in the bucket table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketResolution {
    /// Bucket at or below the elevation.
    pub lower: usize,
    /// Bucket at or above the elevation.
    pub upper: usize,
    /// Share of `upper` in the blend, in `[0, 1)`.
    pub weight: f64,
}

impl BucketResolution {
    /// Whether the elevation sits exactly on one bucket (or was clamped to it).
    pub fn is_exact(&self) -> bool {
        self.lower == self.upper
    }
}

/// Validated Markov fading configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkovConf {
    buckets: Vec<ElevationBucket>,
    fader: FaderConf,
    initial_state: usize,
    velocity: VelocityScaling,
    min_dwell_s: f64,
}

impl MarkovConf {
    /// Default floor on drawn dwell times, in reference seconds.
    pub const DEFAULT_MIN_DWELL_S: f64 = 0.01;

    /// Build and validate a configuration.
    pub fn new(buckets: Vec<ElevationBucket>, fader: FaderConf) -> Result<Self> {
        let conf = Self {
            buckets,
            fader,
            initial_state: 0,
            velocity: VelocityScaling::default(),
            min_dwell_s: Self::DEFAULT_MIN_DWELL_S,
        };
        conf.validate()?;
        Ok(conf)
    }

    /// Set the state every new link starts in.
    pub fn with_initial_state(mut self, state: usize) -> Result<Self> {
        self.initial_state = state;
        self.validate()?;
        Ok(self)
    }

    /// Set the velocity scaling policy.
    pub fn with_velocity_scaling(mut self, velocity: VelocityScaling) -> Result<Self> {
        self.velocity = velocity;
        self.validate()?;
        Ok(self)
    }

    /// Set the floor on drawn dwell times.
    pub fn with_min_dwell(mut self, min_dwell_s: f64) -> Result<Self> {
        self.min_dwell_s = min_dwell_s;
        self.validate()?;
        Ok(self)
    }

    /// Elevation buckets, ordered by elevation.
    pub fn buckets(&self) -> &[ElevationBucket] {
        &self.buckets
    }

    /// Fader parameter table.
    pub fn fader(&self) -> &FaderConf {
        &self.fader
    }

    /// Number of Markov states.
    pub fn state_count(&self) -> usize {
        self.fader.state_count()
    }

    /// Initial state of new links.
    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    /// Velocity scaling policy.
    pub fn velocity_scaling(&self) -> &VelocityScaling {
        &self.velocity
    }

    /// Floor on drawn dwell times.
    pub fn min_dwell_s(&self) -> f64 {
        self.min_dwell_s
    }

    /// Locate `elevation_deg` in the bucket table, clamping outside it.
    pub fn resolve(&self, elevation_deg: f64) -> BucketResolution {
        let last = self.buckets.len() - 1;
        let exact = |index| BucketResolution {
            lower: index,
            upper: index,
            weight: 0.0,
        };

        // Written negated so NaN lands on the first bucket.
        if !(elevation_deg > self.buckets[0].elevation_deg) {
            return exact(0);
        }
        if elevation_deg >= self.buckets[last].elevation_deg {
            return exact(last);
        }

        // First bucket strictly above; the range checks above guarantee 1..=last.
        let upper = self
            .buckets
            .partition_point(|b| b.elevation_deg <= elevation_deg);
        let lower = upper - 1;
        let low = self.buckets[lower].elevation_deg;
        if elevation_deg == low {
            return exact(lower);
        }
        let high = self.buckets[upper].elevation_deg;
        BucketResolution {
            lower,
            upper,
            weight: (elevation_deg - low) / (high - low),
        }
    }

    /// Transition row of `state` blended across the resolved buckets.
    pub fn transition_row(&self, at: &BucketResolution, state: usize) -> Result<Vec<f64>> {
        let low = self.row(at.lower, state)?;
        if at.is_exact() {
            return Ok(low.to_vec());
        }
        let high = self.row(at.upper, state)?;
        Ok(blend(low, high, at.weight))
    }

    /// Mean dwell of `state` blended across the resolved buckets.
    pub fn mean_dwell(&self, at: &BucketResolution, state: usize) -> Result<f64> {
        let dwell = |bucket: usize| -> Result<f64> {
            self.bucket(bucket)?
                .mean_dwell_s
                .get(state)
                .copied()
                .ok_or(FadingError::StateOutOfRange {
                    state,
                    count: self.state_count(),
                })
        };
        let low = dwell(at.lower)?;
        if at.is_exact() {
            return Ok(low);
        }
        Ok(low + (dwell(at.upper)? - low) * at.weight)
    }

    /// Fader parameters of `state` blended across the resolved buckets.
    pub fn fader_parameters(&self, at: &BucketResolution, state: usize) -> Result<Vec<f64>> {
        self.fader.interpolated(at.lower, at.upper, at.weight, state)
    }

    fn bucket(&self, index: usize) -> Result<&ElevationBucket> {
        self.buckets.get(index).ok_or(FadingError::BucketOutOfRange {
            index,
            count: self.buckets.len(),
        })
    }

    fn row(&self, bucket: usize, state: usize) -> Result<&[f64]> {
        self.bucket(bucket)?
            .transitions
            .get(state)
            .map(Vec::as_slice)
            .ok_or(FadingError::StateOutOfRange {
                state,
                count: self.state_count(),
            })
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FadingError::Configuration(msg));

        if self.buckets.is_empty() {
            return invalid("at least one elevation bucket is required".into());
        }
        let states = self.fader.state_count();
        if self.fader.bucket_count() != self.buckets.len() {
            return invalid(format!(
                "{} elevation buckets but {} fader parameter sets",
                self.buckets.len(),
                self.fader.bucket_count()
            ));
        }

        for (index, bucket) in self.buckets.iter().enumerate() {
            if !bucket.elevation_deg.is_finite() {
                return invalid(format!("bucket {} elevation is not finite", index));
            }
            if index > 0 && bucket.elevation_deg <= self.buckets[index - 1].elevation_deg {
                return invalid(format!(
                    "bucket elevations must increase strictly ({} follows {})",
                    bucket.elevation_deg,
                    self.buckets[index - 1].elevation_deg
                ));
            }
            if bucket.transitions.len() != states {
                return invalid(format!(
                    "bucket {} has {} transition rows, expected {}",
                    index,
                    bucket.transitions.len(),
                    states
                ));
            }
            for (from, row) in bucket.transitions.iter().enumerate() {
                if row.len() != states {
                    return invalid(format!(
                        "bucket {} row {} has {} entries, expected {}",
                        index,
                        from,
                        row.len(),
                        states
                    ));
                }
                if row.iter().any(|p| !p.is_finite() || *p < 0.0) {
                    return invalid(format!(
                        "bucket {} row {} has a negative or non-finite probability",
                        index, from
                    ));
                }
                let sum: f64 = row.iter().sum();
                if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return invalid(format!(
                        "bucket {} row {} sums to {}, expected 1",
                        index, from, sum
                    ));
                }
            }
            if bucket.mean_dwell_s.len() != states {
                return invalid(format!(
                    "bucket {} has {} mean dwell times, expected {}",
                    index,
                    bucket.mean_dwell_s.len(),
                    states
                ));
            }
            if bucket.mean_dwell_s.iter().any(|d| !d.is_finite() || *d <= 0.0) {
                return invalid(format!("bucket {} mean dwell times must be positive", index));
            }
        }

        if self.initial_state >= states {
            return invalid(format!(
                "initial state {} out of range ({} states)",
                self.initial_state, states
            ));
        }
        if !(self.min_dwell_s.is_finite() && self.min_dwell_s > 0.0) {
            return invalid(format!("minimum dwell {} must be positive", self.min_dwell_s));
        }
        let v = &self.velocity;
        if !(v.reference_velocity_mps.is_finite() && v.reference_velocity_mps > 0.0) {
            return invalid(format!(
                "reference velocity {} must be positive",
                v.reference_velocity_mps
            ));
        }
        if !(v.min_velocity_mps.is_finite() && v.min_velocity_mps > 0.0) {
            return invalid(format!(
                "minimum velocity {} must be positive",
                v.min_velocity_mps
            ));
        }
        Ok(())
    }
}

impl Default for MarkovConf {
    /// Three states over buckets at 30, 45, 60 and 75 degrees with Loo faders.
    fn default() -> Self {
        let bucket = |elevation_deg: f64, transitions: [[f64; 3]; 3], mean_dwell_s: [f64; 3]| {
            ElevationBucket {
                elevation_deg,
                transitions: transitions.iter().map(|r| r.to_vec()).collect(),
                mean_dwell_s: mean_dwell_s.to_vec(),
            }
        };
        Self {
            buckets: vec![
                bucket(
                    30.0,
                    [
                        [0.9530, 0.0431, 0.0039],
                        [0.0515, 0.9347, 0.0138],
                        [0.0334, 0.0238, 0.9428],
                    ],
                    [1.5, 1.2, 0.8],
                ),
                bucket(
                    45.0,
                    [
                        [0.9600, 0.0360, 0.0040],
                        [0.0700, 0.9200, 0.0100],
                        [0.0500, 0.0300, 0.9200],
                    ],
                    [2.0, 1.0, 0.6],
                ),
                bucket(
                    60.0,
                    [
                        [0.9700, 0.0270, 0.0030],
                        [0.0900, 0.9000, 0.0100],
                        [0.0700, 0.0300, 0.9000],
                    ],
                    [2.5, 0.8, 0.5],
                ),
                bucket(
                    75.0,
                    [
                        [0.9800, 0.0180, 0.0020],
                        [0.1200, 0.8750, 0.0050],
                        [0.1000, 0.0300, 0.8700],
                    ],
                    [3.0, 0.6, 0.4],
                ),
            ],
            fader: FaderConf::default(),
            initial_state: 0,
            velocity: VelocityScaling::default(),
            min_dwell_s: Self::DEFAULT_MIN_DWELL_S,
        }
    }
}

fn blend(low: &[f64], high: &[f64], weight: f64) -> Vec<f64> {
    low.iter()
        .zip(high)
        .map(|(l, h)| l + (h - l) * weight)
        .collect()
}
