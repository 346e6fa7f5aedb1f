//! Per-link Markov fading state.

use crate::conf::{BucketResolution, MarkovConf};
use crate::fader::Fader;
use crate::provider::ParameterProvider;
use crate::{FadingError, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand_chacha::ChaCha8Rng;
use rand_distr::Exp;
use satsim_common::SimTime;
use serde::Serialize;
use tracing::trace;

/// Upper bound on transitions taken within one update.
///
/// Long gaps between queries are rare; past this many transitions the chain
/// has forgotten its starting state and the rest of the gap is dropped.
pub const MAX_TRANSITIONS_PER_UPDATE: usize = 10_000;

/// Snapshot of a link's fading state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkFadingState {
    /// Current Markov state.
    pub state: usize,
    /// Dwell left in the current state, in reference seconds.
    pub residual_dwell_s: f64,
    /// Time of the last update.
    pub last_update: SimTime,
    /// Bucket blend used at the last update.
    pub resolution: BucketResolution,
    /// State changes so far (self-transitions excluded).
    pub transitions: u64,
}

/// Markov fading model of one link.
#[derive(Debug, Clone)]
pub struct MarkovModel {
    state: usize,
    residual_dwell_s: f64,
    last_update: SimTime,
    resolution: BucketResolution,
    transitions: u64,
    fader: Fader,
    rng: ChaCha8Rng,
}

impl MarkovModel {
    /// Start a model in the configured initial state at time `now`.
    pub fn new(conf: &MarkovConf, elevation_deg: f64, now: SimTime, mut rng: ChaCha8Rng) -> Result<Self> {
        check_input("elevation", elevation_deg)?;
        let resolution = conf.resolve(elevation_deg);
        let state = conf.initial_state();
        let fader = Fader::new(&mut rng);
        let residual_dwell_s = draw_dwell(conf, &resolution, state, &mut rng)?;
        Ok(Self {
            state,
            residual_dwell_s,
            last_update: now,
            resolution,
            transitions: 0,
            fader,
            rng,
        })
    }

    /// Current state.
    pub fn state(&self) -> usize {
        self.state
    }

    /// Diagnostic snapshot.
    pub fn snapshot(&self) -> LinkFadingState {
        LinkFadingState {
            state: self.state,
            residual_dwell_s: self.residual_dwell_s,
            last_update: self.last_update,
            resolution: self.resolution,
            transitions: self.transitions,
        }
    }

    /// Advance the chain to `now` and return the number of state changes.
    ///
    /// Elapsed time is scaled by velocity into dwell progress; each expired
    /// dwell picks the next state from the blended transition row and draws a
    /// fresh dwell. A query at or before the last update changes nothing.
    pub fn advance(
        &mut self,
        conf: &MarkovConf,
        elevation_deg: f64,
        velocity_mps: f64,
        now: SimTime,
    ) -> Result<u64> {
        check_input("elevation", elevation_deg)?;
        check_input("velocity", velocity_mps)?;

        self.resolution = conf.resolve(elevation_deg);
        let elapsed_s = now.saturating_since(self.last_update).as_secs_f64();
        if now > self.last_update {
            self.last_update = now;
        }

        let mut progress = elapsed_s * conf.velocity_scaling().rate(velocity_mps);
        let mut changes = 0;
        let mut expiries = 0;

        while progress >= self.residual_dwell_s {
            if expiries == MAX_TRANSITIONS_PER_UPDATE {
                trace!(dropped_s = progress, "Transition limit reached");
                // The fresh dwell starts at `now`.
                progress = 0.0;
                break;
            }
            expiries += 1;
            progress -= self.residual_dwell_s;

            let row = conf.transition_row(&self.resolution, self.state)?;
            let next = WeightedIndex::new(&row)
                .map_err(|e| FadingError::Configuration(format!("transition row {:?}: {}", row, e)))?
                .sample(&mut self.rng);
            if next != self.state {
                trace!(from = self.state, to = next, "Fading state transition");
                self.state = next;
                changes += 1;
            }
            self.residual_dwell_s = draw_dwell(conf, &self.resolution, self.state, &mut self.rng)?;
        }
        self.residual_dwell_s -= progress.min(self.residual_dwell_s);

        self.transitions += changes;
        Ok(changes)
    }

    /// Fading sample (dB) for the current state at time `now`.
    pub fn sample_db(&self, conf: &MarkovConf, now: SimTime) -> Result<f64> {
        let params = conf.fader_parameters(&self.resolution, self.state)?;
        self.fader
            .sample_db(conf.fader().family(), &params, now.as_secs_f64())
    }

    /// Fader parameters in effect for the current state and elevation.
    pub fn parameters(&self, conf: &MarkovConf) -> Result<Vec<f64>> {
        conf.fader_parameters(&self.resolution, self.state)
    }
}

fn check_input(input: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FadingError::InvalidInput { input, value })
    }
}

fn draw_dwell(
    conf: &MarkovConf,
    at: &BucketResolution,
    state: usize,
    rng: &mut ChaCha8Rng,
) -> Result<f64> {
    let mean = conf.mean_dwell(at, state)?;
    let exp = Exp::new(mean.recip())
        .map_err(|e| FadingError::Configuration(format!("mean dwell {}: {}", mean, e)))?;
    Ok(exp.sample(rng).max(conf.min_dwell_s()))
}
