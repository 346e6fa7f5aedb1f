//! Per-link fading facade.

use crate::conf::MarkovConf;
use crate::model::{LinkFadingState, MarkovModel};
use crate::{FadingError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use satsim_common::{LinkKey, SimTime};
use satsim_metrics::{metric_defs, metrics, LinkLabels};
use satsim_trace::{TraceCache, TraceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Query functions for the terminal's current elevation and velocity.
///
/// Both are called on every fading request, never cached.
pub struct FadingInputs {
    elevation_deg: Box<dyn Fn() -> f64>,
    velocity_mps: Box<dyn Fn() -> f64>,
}

impl FadingInputs {
    /// Wrap elevation (degrees) and velocity (m/s) queries.
    pub fn new(
        elevation_deg: impl Fn() -> f64 + 'static,
        velocity_mps: impl Fn() -> f64 + 'static,
    ) -> Self {
        Self {
            elevation_deg: Box::new(elevation_deg),
            velocity_mps: Box::new(velocity_mps),
        }
    }

    /// Fixed elevation and velocity.
    pub fn constant(elevation_deg: f64, velocity_mps: f64) -> Self {
        Self::new(move || elevation_deg, move || velocity_mps)
    }

    /// Current elevation in degrees.
    pub fn elevation_deg(&self) -> f64 {
        (self.elevation_deg)()
    }

    /// Current velocity in m/s.
    pub fn velocity_mps(&self) -> f64 {
        (self.velocity_mps)()
    }
}

impl fmt::Debug for FadingInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FadingInputs").finish_non_exhaustive()
    }
}

/// Where fading samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadingMode {
    /// Stochastic Markov model per link.
    #[default]
    Markov,
    /// Recorded fading traces per link.
    Trace,
}

#[derive(Debug)]
enum Source {
    Markov {
        conf: MarkovConf,
        inputs: FadingInputs,
        seed: u64,
        models: HashMap<LinkKey, MarkovModel>,
    },
    Trace {
        cache: TraceCache,
    },
}

/// Owns one fading model (or trace binding) per link.
///
/// ```
/// use satsim_common::{ChannelType, LinkKey, MacAddress, SimTime};
/// use satsim_fading::{FadingInputs, MarkovConf, MarkovContainer};
///
/// let mut fading = MarkovContainer::new(MarkovConf::default(), FadingInputs::constant(45.0, 0.0), 1);
/// let key = LinkKey::new(MacAddress::from_index(1), ChannelType::ForwardUser);
/// let db = fading.get_fading(&key, SimTime::from_millis(10)).unwrap();
/// assert!(db.is_finite());
/// ```
#[derive(Debug)]
pub struct MarkovContainer {
    source: Source,
}

impl MarkovContainer {
    /// Markov-driven fading with per-link RNGs derived from `seed`.
    pub fn new(conf: MarkovConf, inputs: FadingInputs, seed: u64) -> Self {
        Self {
            source: Source::Markov {
                conf,
                inputs,
                seed,
                models: HashMap::new(),
            },
        }
    }

    /// Trace-driven fading. The cache must serve fading traces.
    pub fn trace_driven(cache: TraceCache) -> Result<Self> {
        if cache.kind() != TraceKind::Fading {
            return Err(FadingError::Configuration(format!(
                "trace-driven fading needs a fading trace cache, got {}",
                cache.kind()
            )));
        }
        Ok(Self {
            source: Source::Trace { cache },
        })
    }

    /// Which source this container draws from.
    pub fn mode(&self) -> FadingMode {
        match self.source {
            Source::Markov { .. } => FadingMode::Markov,
            Source::Trace { .. } => FadingMode::Trace,
        }
    }

    /// Number of links seen so far.
    pub fn link_count(&self) -> usize {
        match &self.source {
            Source::Markov { models, .. } => models.len(),
            Source::Trace { cache } => cache.len(),
        }
    }

    /// Fading sample (dB) for `key` at `now`.
    ///
    /// The first request for a key creates its model (or trace binding).
    /// Markov mode reads elevation and velocity, advances the link's chain to
    /// `now` and samples the fader for the resulting state.
    pub fn get_fading(&mut self, key: &LinkKey, now: SimTime) -> Result<f64> {
        let sample = match &mut self.source {
            Source::Markov {
                conf,
                inputs,
                seed,
                models,
            } => {
                let elevation = inputs.elevation_deg();
                let velocity = inputs.velocity_mps();

                let model = match models.entry(*key) {
                    std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                    std::collections::hash_map::Entry::Vacant(e) => {
                        let rng = ChaCha8Rng::seed_from_u64(key.derive_seed(*seed));
                        let model = MarkovModel::new(conf, elevation, now, rng)?;
                        debug!(link = %key, elevation, state = model.state(), "Created fading model");
                        metrics::counter!(
                            metric_defs::FADING_MODELS_CREATED.name,
                            &LinkLabels::from_key(key).to_labels()
                        )
                        .increment(1);
                        e.insert(model)
                    }
                };

                let changes = model.advance(conf, elevation, velocity, now)?;
                if changes > 0 {
                    metrics::counter!(
                        metric_defs::FADING_STATE_TRANSITIONS.name,
                        &LinkLabels::from_key(key).to_labels()
                    )
                    .increment(changes);
                }
                model.sample_db(conf, now)?
            }
            Source::Trace { cache } => {
                if cache.register(*key) {
                    debug!(link = %key, "Bound link to fading trace");
                }
                cache.fading_db(key)?
            }
        };

        metrics::histogram!(
            metric_defs::FADING_SAMPLE_DB.name,
            &LinkLabels::from_key(key).to_labels()
        )
        .record(sample);
        Ok(sample)
    }

    /// Diagnostic snapshot of a link's Markov state.
    ///
    /// `None` for unseen links and in trace mode.
    pub fn state(&self, key: &LinkKey) -> Option<LinkFadingState> {
        match &self.source {
            Source::Markov { models, .. } => models.get(key).map(MarkovModel::snapshot),
            Source::Trace { .. } => None,
        }
    }

    /// Fader parameters currently in effect for a link in Markov mode.
    pub fn parameters(&self, key: &LinkKey) -> Option<Vec<f64>> {
        match &self.source {
            Source::Markov { conf, models, .. } => {
                models.get(key).and_then(|m| m.parameters(conf).ok())
            }
            Source::Trace { .. } => None,
        }
    }

    /// Markov configuration, if in Markov mode.
    pub fn conf(&self) -> Option<&MarkovConf> {
        match &self.source {
            Source::Markov { conf, .. } => Some(conf),
            Source::Trace { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satsim_common::{ChannelType, MacAddress};
    use satsim_trace::TraceConfig;
    use std::cell::Cell;
    use std::rc::Rc;

    fn key(index: u64) -> LinkKey {
        LinkKey::new(MacAddress::from_index(index), ChannelType::ForwardUser)
    }

    #[test]
    fn test_model_created_once_per_key() {
        let mut fading = MarkovContainer::new(MarkovConf::default(), FadingInputs::constant(45.0, 0.0), 7);
        fading.get_fading(&key(1), SimTime::from_millis(10)).unwrap();
        fading.get_fading(&key(1), SimTime::from_millis(20)).unwrap();
        fading.get_fading(&key(2), SimTime::from_millis(20)).unwrap();
        assert_eq!(fading.link_count(), 2);
        assert_eq!(fading.mode(), FadingMode::Markov);
        assert!(fading.state(&key(3)).is_none());
    }

    #[test]
    fn test_inputs_are_read_on_every_call() {
        let elevation = Rc::new(Cell::new(30.0));
        let calls = Rc::new(Cell::new(0));
        let inputs = {
            let elevation = elevation.clone();
            let calls = calls.clone();
            FadingInputs::new(
                move || {
                    calls.set(calls.get() + 1);
                    elevation.get()
                },
                || 0.0,
            )
        };
        let mut fading = MarkovContainer::new(MarkovConf::default(), inputs, 1);

        fading.get_fading(&key(1), SimTime::from_millis(1)).unwrap();
        elevation.set(75.0);
        fading.get_fading(&key(1), SimTime::from_millis(2)).unwrap();

        assert_eq!(calls.get(), 2);
        let state = fading.state(&key(1)).unwrap();
        assert_eq!((state.resolution.lower, state.resolution.upper), (3, 3));
    }

    #[test]
    fn test_same_seed_same_samples() {
        let run = |seed| {
            let mut fading = MarkovContainer::new(MarkovConf::default(), FadingInputs::constant(50.0, 5.0), seed);
            (1..=20)
                .map(|i| fading.get_fading(&key(1), SimTime::from_millis(i * 10)).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
    }

    #[test]
    fn test_trace_mode_requires_fading_cache() {
        let cache = TraceCache::new(TraceConfig::new("/nonexistent"), TraceKind::Interference);
        assert!(matches!(
            MarkovContainer::trace_driven(cache),
            Err(FadingError::Configuration(_))
        ));
    }

    #[test]
    fn test_trace_mode_surfaces_trace_errors() {
        let cache = TraceCache::new(TraceConfig::new("/nonexistent"), TraceKind::Fading);
        let mut fading = MarkovContainer::trace_driven(cache).unwrap();
        assert_eq!(fading.mode(), FadingMode::Trace);
        assert!(matches!(
            fading.get_fading(&key(1), SimTime::ZERO),
            Err(FadingError::Trace(_))
        ));
        assert_eq!(fading.link_count(), 1);
        assert!(fading.state(&key(1)).is_none());
    }
}
