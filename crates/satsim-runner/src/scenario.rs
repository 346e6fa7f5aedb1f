//! Scripted scenarios driven by the event timeline.
//!
//! A scenario lists the links to observe, the terminal's starting elevation
//! and velocity, and timed events. Elevation and velocity live in shared
//! cells read by the fading facade on every request, so a `set_elevation`
//! event is seen by the next `get_fading` without the facade being told.
//!
//! ```yaml
//! links:
//!   - address: "00:00:00:00:00:01"
//!     channel: FORWARD_USER_CH
//! initial_elevation_deg: 45
//! initial_velocity_mps: 0
//! events:
//!   - { event: get_fading, at_ms: 10 }
//!   - { event: set_elevation, at_ms: 45, elevation_deg: 55 }
//!   - { event: set_velocity, at_ms: 60, velocity_mps: 20 }
//!   - { event: get_interference, at_ms: 70 }
//! ```

use crate::{Result, RunnerError};
use satsim_common::{ChannelType, LinkKey, MacAddress, SimTime, Timeline};
use satsim_fading::{FadingInputs, MarkovContainer};
use satsim_model::Model;
use satsim_trace::TraceCache;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

// ============================================================================
// Schema
// ============================================================================

/// A scripted run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Links sampled by every `get_fading` and `get_interference` event.
    #[serde(default = "default_links")]
    pub links: Vec<LinkKey>,
    /// Elevation before the first `set_elevation`, in degrees.
    #[serde(default = "default_elevation_deg")]
    pub initial_elevation_deg: f64,
    /// Velocity before the first `set_velocity`, in m/s.
    #[serde(default)]
    pub initial_velocity_mps: f64,
    /// Timed events; order in the file only matters for equal times.
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

fn default_links() -> Vec<LinkKey> {
    vec![LinkKey::new(MacAddress::default(), ChannelType::ForwardUser)]
}

fn default_elevation_deg() -> f64 {
    45.0
}

/// One timed scenario event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScenarioEvent {
    /// Move the terminal to a new elevation.
    SetElevation {
        /// Event time in milliseconds.
        at_ms: u64,
        /// New elevation in degrees.
        elevation_deg: f64,
    },
    /// Change the terminal velocity.
    SetVelocity {
        /// Event time in milliseconds.
        at_ms: u64,
        /// New velocity in m/s.
        velocity_mps: f64,
    },
    /// Sample fading on every link.
    GetFading {
        /// Event time in milliseconds.
        at_ms: u64,
    },
    /// Read the next interference density row on every link.
    GetInterference {
        /// Event time in milliseconds.
        at_ms: u64,
    },
}

impl ScenarioEvent {
    /// Simulation time of the event.
    pub fn at(&self) -> SimTime {
        let ms = match self {
            ScenarioEvent::SetElevation { at_ms, .. }
            | ScenarioEvent::SetVelocity { at_ms, .. }
            | ScenarioEvent::GetFading { at_ms }
            | ScenarioEvent::GetInterference { at_ms } => *at_ms,
        };
        SimTime::from_millis(ms)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            links: default_links(),
            initial_elevation_deg: default_elevation_deg(),
            initial_velocity_mps: 0.0,
            events: Vec::new(),
        }
    }
}

impl Scenario {
    /// The Markov logic walkthrough: one forward user link starting at 45°,
    /// stepped to 55° and then 75° between fading samples.
    pub fn markov_logic() -> Self {
        use ScenarioEvent::*;
        Self {
            events: vec![
                SetVelocity { at_ms: 5, velocity_mps: 0.0 },
                GetFading { at_ms: 10 },
                GetFading { at_ms: 30 },
                SetElevation { at_ms: 45, elevation_deg: 55.0 },
                GetFading { at_ms: 50 },
                GetFading { at_ms: 60 },
                GetFading { at_ms: 90 },
                SetElevation { at_ms: 95, elevation_deg: 75.0 },
                GetFading { at_ms: 100 },
                GetFading { at_ms: 130 },
                GetFading { at_ms: 200 },
            ],
            ..Self::default()
        }
    }

    /// Parse a scenario from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a scenario file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Reject scenarios that cannot run regardless of the model.
    pub fn validate(&self) -> Result<()> {
        if self.links.is_empty() {
            return Err(RunnerError::Scenario("at least one link is required".into()));
        }
        let mut seen = HashSet::new();
        for key in &self.links {
            if !seen.insert(key) {
                return Err(RunnerError::Scenario(format!("link {key} listed twice")));
            }
        }
        check_finite("initial_elevation_deg", self.initial_elevation_deg)?;
        check_finite("initial_velocity_mps", self.initial_velocity_mps)?;
        for event in &self.events {
            match *event {
                ScenarioEvent::SetElevation { elevation_deg, .. } => {
                    check_finite("elevation_deg", elevation_deg)?
                }
                ScenarioEvent::SetVelocity { velocity_mps, .. } => {
                    check_finite("velocity_mps", velocity_mps)?
                }
                ScenarioEvent::GetFading { .. } | ScenarioEvent::GetInterference { .. } => {}
            }
        }
        Ok(())
    }

    /// Whether any event reads interference traces.
    pub fn needs_interference(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ScenarioEvent::GetInterference { .. }))
    }
}

fn check_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RunnerError::Scenario(format!("{field} must be finite, got {value}")))
    }
}

// ============================================================================
// Output records
// ============================================================================

/// One observation made during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleRecord {
    /// A fading sample.
    Fading {
        /// Simulation time in seconds.
        time_s: f64,
        /// Link sampled.
        link: LinkKey,
        /// Elevation seen by the facade.
        elevation_deg: f64,
        /// Velocity seen by the facade.
        velocity_mps: f64,
        /// Markov state after the update; absent for trace-driven fading.
        state: Option<usize>,
        /// Fading in dB.
        fading_db: f64,
    },
    /// An interference density row.
    Interference {
        /// Simulation time in seconds.
        time_s: f64,
        /// Link sampled.
        link: LinkKey,
        /// Interference power density.
        density: f64,
    },
}

// ============================================================================
// Runner
// ============================================================================

struct RunState {
    fading: MarkovContainer,
    interference: Option<TraceCache>,
    elevation_deg: Rc<Cell<f64>>,
    velocity_mps: Rc<Cell<f64>>,
    links: Vec<LinkKey>,
    records: Vec<SampleRecord>,
}

impl RunState {
    fn apply(&mut self, event: ScenarioEvent, now: SimTime) -> Result<()> {
        match event {
            ScenarioEvent::SetElevation { elevation_deg, .. } => {
                debug!(%now, elevation_deg, "Set elevation");
                self.elevation_deg.set(elevation_deg);
            }
            ScenarioEvent::SetVelocity { velocity_mps, .. } => {
                debug!(%now, velocity_mps, "Set velocity");
                self.velocity_mps.set(velocity_mps);
            }
            ScenarioEvent::GetFading { .. } => self.sample_fading(now)?,
            ScenarioEvent::GetInterference { .. } => self.sample_interference(now)?,
        }
        Ok(())
    }

    fn sample_fading(&mut self, now: SimTime) -> Result<()> {
        for key in &self.links {
            let fading_db = self.fading.get_fading(key, now)?;
            let state = self.fading.state(key).map(|s| s.state);
            let elevation_deg = self.elevation_deg.get();
            let velocity_mps = self.velocity_mps.get();
            info!(%now, link = %key, elevation_deg, velocity_mps, ?state, fading_db, "Fading sample");
            self.records.push(SampleRecord::Fading {
                time_s: now.as_secs_f64(),
                link: *key,
                elevation_deg,
                velocity_mps,
                state,
                fading_db,
            });
        }
        Ok(())
    }

    fn sample_interference(&mut self, now: SimTime) -> Result<()> {
        let Some(cache) = self.interference.as_mut() else {
            return Err(RunnerError::Scenario("no interference traces configured".into()));
        };
        for key in &self.links {
            let density = cache.interference_density(key)?;
            info!(%now, link = %key, density, "Interference sample");
            self.records.push(SampleRecord::Interference {
                time_s: now.as_secs_f64(),
                link: *key,
                density,
            });
        }
        Ok(())
    }
}

/// Executes a [`Scenario`] against a validated [`Model`].
pub struct ScenarioRunner {
    timeline: Timeline<RunState, RunnerError>,
    state: RunState,
}

impl ScenarioRunner {
    /// Validate the scenario, build the fading facade and schedule every event.
    pub fn new(model: &Model, scenario: &Scenario) -> Result<Self> {
        scenario.validate()?;

        let elevation_deg = Rc::new(Cell::new(scenario.initial_elevation_deg));
        let velocity_mps = Rc::new(Cell::new(scenario.initial_velocity_mps));
        let inputs = {
            let elevation_deg = Rc::clone(&elevation_deg);
            let velocity_mps = Rc::clone(&velocity_mps);
            FadingInputs::new(move || elevation_deg.get(), move || velocity_mps.get())
        };
        let fading = model.fading_container(inputs)?;

        let interference = if scenario.needs_interference() {
            let mut cache = model.interference_cache().ok_or_else(|| {
                RunnerError::Scenario("get_interference events need a trace section".into())
            })?;
            for key in &scenario.links {
                cache.register(*key);
            }
            Some(cache)
        } else {
            None
        };

        let mut timeline = Timeline::new();
        for event in scenario.events.iter().copied() {
            timeline.schedule(event.at(), move |state: &mut RunState, now| {
                state.apply(event, now)
            })?;
        }

        info!(
            links = scenario.links.len(),
            events = scenario.events.len(),
            mode = ?fading.mode(),
            "Scenario ready"
        );

        Ok(Self {
            timeline,
            state: RunState {
                fading,
                interference,
                elevation_deg,
                velocity_mps,
                links: scenario.links.clone(),
                records: Vec::new(),
            },
        })
    }

    /// Run every remaining event. Returns the number executed.
    pub fn run(&mut self) -> Result<u64> {
        let executed = self.timeline.run(&mut self.state)?;
        info!(executed, now = %self.timeline.now(), records = self.state.records.len(), "Scenario complete");
        Ok(executed)
    }

    /// Run events up to and including `end`.
    pub fn run_until(&mut self, end: SimTime) -> Result<u64> {
        self.timeline.run_until(&mut self.state, end)
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.timeline.now()
    }

    /// Events not yet executed.
    pub fn pending(&self) -> usize {
        self.timeline.pending()
    }

    /// Records collected so far.
    pub fn records(&self) -> &[SampleRecord] {
        &self.state.records
    }

    /// Consume the runner, returning its records.
    pub fn into_records(self) -> Vec<SampleRecord> {
        self.state.records
    }

    /// The fading facade, for inspecting per-link state.
    pub fn fading(&self) -> &MarkovContainer {
        &self.state.fading
    }
}
