//! Fader parameter tables indexed by elevation bucket and state.

use crate::fader::MAX_OSCILLATORS;
use crate::{FadingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Family of fader a parameter table feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaderFamily {
    /// Rayleigh multipath only.
    Rayleigh,
    /// Loo: log-normal shadowed direct signal plus Rayleigh multipath.
    Loo,
}

impl FaderFamily {
    /// Number of parameters per state.
    pub const fn parameter_count(&self) -> usize {
        match self {
            FaderFamily::Rayleigh => RayleighConf::PARAMETER_COUNT,
            FaderFamily::Loo => LooConf::PARAMETER_COUNT,
        }
    }
}

impl fmt::Display for FaderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaderFamily::Rayleigh => f.write_str("rayleigh"),
            FaderFamily::Loo => f.write_str("loo"),
        }
    }
}

/// Supplies fader parameter tuples per elevation bucket and state.
///
/// The Markov model only sees this trait, so it works unchanged with any
/// fader family.
pub trait ParameterProvider {
    /// Fader family the tuples are meant for.
    fn family(&self) -> FaderFamily;

    /// Number of elevation buckets.
    fn bucket_count(&self) -> usize;

    /// Number of states in every bucket.
    fn state_count(&self) -> usize;

    /// One parameter tuple per state for bucket `bucket`.
    fn parameters(&self, bucket: usize) -> Result<&[Vec<f64>]>;

    /// Number of values in each tuple.
    fn parameter_count(&self) -> usize {
        self.family().parameter_count()
    }

    /// The tuple for one bucket and state.
    fn state_parameters(&self, bucket: usize, state: usize) -> Result<&[f64]> {
        let set = self.parameters(bucket)?;
        set.get(state)
            .map(Vec::as_slice)
            .ok_or(FadingError::StateOutOfRange {
                state,
                count: set.len(),
            })
    }

    /// Linear blend of the tuples of `state` in two buckets.
    ///
    /// `weight` is the share of `upper` (0 gives `lower` unchanged).
    fn interpolated(&self, lower: usize, upper: usize, weight: f64, state: usize) -> Result<Vec<f64>> {
        let low = self.state_parameters(lower, state)?;
        if lower == upper || weight <= 0.0 {
            return Ok(low.to_vec());
        }
        let high = self.state_parameters(upper, state)?;
        Ok(low
            .iter()
            .zip(high)
            .map(|(l, h)| l + (h - l) * weight)
            .collect())
    }
}

// ============================================================================
// Shared table
// ============================================================================

/// `[bucket][state][parameter]` storage with shape checks.
#[derive(Debug, Clone, PartialEq)]
struct ParameterTable(Vec<Vec<Vec<f64>>>);

impl ParameterTable {
    fn new(family: FaderFamily, table: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let state_count = table.first().map_or(0, Vec::len);
        if table.is_empty() || state_count == 0 {
            return Err(FadingError::Configuration(format!(
                "{} parameter table needs at least one bucket and one state",
                family
            )));
        }

        for (bucket, states) in table.iter().enumerate() {
            if states.len() != state_count {
                return Err(FadingError::Configuration(format!(
                    "{} bucket {} has {} states, expected {}",
                    family,
                    bucket,
                    states.len(),
                    state_count
                )));
            }
            for (state, tuple) in states.iter().enumerate() {
                if tuple.len() != family.parameter_count() {
                    return Err(FadingError::Configuration(format!(
                        "{} bucket {} state {} has {} parameters, expected {}",
                        family,
                        bucket,
                        state,
                        tuple.len(),
                        family.parameter_count()
                    )));
                }
                check_tuple(family, tuple).map_err(|reason| {
                    FadingError::Configuration(format!(
                        "{} bucket {} state {}: {}",
                        family, bucket, state, reason
                    ))
                })?;
            }
        }

        Ok(Self(table))
    }

    fn bucket_count(&self) -> usize {
        self.0.len()
    }

    fn state_count(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    fn bucket(&self, index: usize) -> Result<&[Vec<f64>]> {
        self.0
            .get(index)
            .map(Vec::as_slice)
            .ok_or(FadingError::BucketOutOfRange {
                index,
                count: self.0.len(),
            })
    }
}

fn check_tuple(family: FaderFamily, tuple: &[f64]) -> std::result::Result<(), String> {
    if let Some(v) = tuple.iter().find(|v| !v.is_finite()) {
        return Err(format!("non-finite parameter {}", v));
    }
    let check_oscillators = |n: f64, what: &str| {
        if n < 1.0 || n > MAX_OSCILLATORS as f64 {
            Err(format!("{} oscillators {} outside 1..={}", what, n, MAX_OSCILLATORS))
        } else {
            Ok(())
        }
    };
    let check_doppler = |f: f64, what: &str| {
        if f < 0.0 {
            Err(format!("negative {} Doppler {}", what, f))
        } else {
            Ok(())
        }
    };

    match family {
        FaderFamily::Rayleigh => {
            check_oscillators(tuple[RayleighConf::OSCILLATORS], "multipath")?;
            check_doppler(tuple[RayleighConf::DOPPLER_HZ], "multipath")?;
        }
        FaderFamily::Loo => {
            if tuple[LooConf::DIRECT_STD_DB] < 0.0 {
                return Err(format!("negative direct std {}", tuple[LooConf::DIRECT_STD_DB]));
            }
            check_oscillators(tuple[LooConf::DIRECT_OSCILLATORS], "direct")?;
            check_oscillators(tuple[LooConf::MULTIPATH_OSCILLATORS], "multipath")?;
            check_doppler(tuple[LooConf::DIRECT_DOPPLER_HZ], "direct")?;
            check_doppler(tuple[LooConf::MULTIPATH_DOPPLER_HZ], "multipath")?;
        }
    }
    Ok(())
}

// ============================================================================
// Rayleigh
// ============================================================================

/// Rayleigh fader parameters: oscillator count and maximum Doppler per state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<f64>>>", into = "Vec<Vec<Vec<f64>>>")]
pub struct RayleighConf {
    table: ParameterTable,
}

impl RayleighConf {
    /// Values per state.
    pub const PARAMETER_COUNT: usize = 2;
    /// Index of the oscillator count.
    pub const OSCILLATORS: usize = 0;
    /// Index of the maximum Doppler frequency (Hz).
    pub const DOPPLER_HZ: usize = 1;

    /// Build from a `[bucket][state][parameter]` table.
    pub fn new(table: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        Ok(Self {
            table: ParameterTable::new(FaderFamily::Rayleigh, table)?,
        })
    }

    /// The same tuple for every bucket and state.
    pub fn uniform(bucket_count: usize, state_count: usize, oscillators: u32, doppler_hz: f64) -> Result<Self> {
        let tuple = vec![oscillators as f64, doppler_hz];
        Self::new(vec![vec![tuple; state_count]; bucket_count])
    }
}

impl Default for RayleighConf {
    /// Four buckets of three states with twelve oscillators each. Doppler
    /// spread narrows from the clear state to the blocked one.
    fn default() -> Self {
        let states = vec![vec![12.0, 30.0], vec![12.0, 20.0], vec![12.0, 10.0]];
        Self {
            table: ParameterTable(vec![states; 4]),
        }
    }
}

impl TryFrom<Vec<Vec<Vec<f64>>>> for RayleighConf {
    type Error = FadingError;

    fn try_from(table: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        Self::new(table)
    }
}

impl From<RayleighConf> for Vec<Vec<Vec<f64>>> {
    fn from(conf: RayleighConf) -> Self {
        conf.table.0
    }
}

impl ParameterProvider for RayleighConf {
    fn family(&self) -> FaderFamily {
        FaderFamily::Rayleigh
    }

    fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    fn state_count(&self) -> usize {
        self.table.state_count()
    }

    fn parameters(&self, bucket: usize) -> Result<&[Vec<f64>]> {
        self.table.bucket(bucket)
    }
}

// ============================================================================
// Loo
// ============================================================================

/// Loo fader parameters per state.
///
/// Tuple layout: direct mean (dB), direct std (dB), multipath power (dB),
/// direct oscillators, multipath oscillators, direct Doppler (Hz),
/// multipath Doppler (Hz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<f64>>>", into = "Vec<Vec<Vec<f64>>>")]
pub struct LooConf {
    table: ParameterTable,
}

impl LooConf {
    /// Values per state.
    pub const PARAMETER_COUNT: usize = 7;
    /// Direct signal mean, dB.
    pub const DIRECT_MEAN_DB: usize = 0;
    /// Direct signal standard deviation, dB.
    pub const DIRECT_STD_DB: usize = 1;
    /// Average multipath power, dB.
    pub const MULTIPATH_POWER_DB: usize = 2;
    /// Oscillators shaping the direct signal.
    pub const DIRECT_OSCILLATORS: usize = 3;
    /// Oscillators of the multipath component.
    pub const MULTIPATH_OSCILLATORS: usize = 4;
    /// Doppler of the direct signal variation, Hz.
    pub const DIRECT_DOPPLER_HZ: usize = 5;
    /// Doppler of the multipath component, Hz.
    pub const MULTIPATH_DOPPLER_HZ: usize = 6;

    /// Build from a `[bucket][state][parameter]` table.
    pub fn new(table: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        Ok(Self {
            table: ParameterTable::new(FaderFamily::Loo, table)?,
        })
    }
}

impl Default for LooConf {
    /// Four buckets (30, 45, 60, 75 degrees) of three states: clear line of
    /// sight, moderate shadowing and deep shadowing.
    fn default() -> Self {
        let table = (0..4)
            .map(|bucket| {
                // Shadowing eases with elevation.
                let lift = bucket as f64;
                vec![
                    vec![-0.5 + 0.1 * lift, 0.5, -20.0 - lift, 10.0, 10.0, 0.5, 30.0],
                    vec![-6.0 + 0.5 * lift, 3.0, -12.0 - lift, 10.0, 10.0, 0.5, 30.0],
                    vec![-15.0 + lift, 5.0, -15.0 - 0.5 * lift, 10.0, 10.0, 0.5, 30.0],
                ]
            })
            .collect();
        Self {
            table: ParameterTable(table),
        }
    }
}

impl TryFrom<Vec<Vec<Vec<f64>>>> for LooConf {
    type Error = FadingError;

    fn try_from(table: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        Self::new(table)
    }
}

impl From<LooConf> for Vec<Vec<Vec<f64>>> {
    fn from(conf: LooConf) -> Self {
        conf.table.0
    }
}

impl ParameterProvider for LooConf {
    fn family(&self) -> FaderFamily {
        FaderFamily::Loo
    }

    fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    fn state_count(&self) -> usize {
        self.table.state_count()
    }

    fn parameters(&self, bucket: usize) -> Result<&[Vec<f64>]> {
        self.table.bucket(bucket)
    }
}

// ============================================================================
// Either family
// ============================================================================

/// Parameter table of whichever fader family is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "parameters", rename_all = "lowercase")]
pub enum FaderConf {
    /// Rayleigh parameters.
    Rayleigh(RayleighConf),
    /// Loo parameters.
    Loo(LooConf),
}

impl Default for FaderConf {
    fn default() -> Self {
        FaderConf::Loo(LooConf::default())
    }
}

impl FaderConf {
    fn provider(&self) -> &dyn ParameterProvider {
        match self {
            FaderConf::Rayleigh(conf) => conf,
            FaderConf::Loo(conf) => conf,
        }
    }
}

impl ParameterProvider for FaderConf {
    fn family(&self) -> FaderFamily {
        self.provider().family()
    }

    fn bucket_count(&self) -> usize {
        self.provider().bucket_count()
    }

    fn state_count(&self) -> usize {
        self.provider().state_count()
    }

    fn parameters(&self, bucket: usize) -> Result<&[Vec<f64>]> {
        self.provider().parameters(bucket)
    }
}
