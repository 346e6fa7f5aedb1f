//! Configuration file schema and its validation.

use crate::{ModelError, Result};
use satsim_fading::{
    ElevationBucket, FaderConf, FadingInputs, FadingMode, MarkovConf, MarkovContainer,
    VelocityScaling,
};
use satsim_frame::{BbFrameConf, BbFrameType, FrameEntry, ModCod, DUMMY_PLFRAME_SYMBOLS};
use satsim_trace::{TraceCache, TraceConfig, TraceKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

// ============================================================================
// Schema
// ============================================================================

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Base seed for every per-link random stream.
    #[serde(default)]
    pub seed: u64,
    /// Fading model.
    #[serde(default)]
    pub fading: FadingSection,
    /// Frame table.
    #[serde(default)]
    pub frame: FrameSection,
    /// Trace input location; required in trace mode.
    #[serde(default)]
    pub trace: Option<TraceConfig>,
}

/// Fading model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FadingSection {
    /// Markov model or recorded traces.
    #[serde(default)]
    pub mode: FadingMode,
    /// State every link starts in.
    #[serde(default)]
    pub initial_state: usize,
    /// Floor on drawn dwell times, in reference seconds.
    #[serde(default = "default_min_dwell_s")]
    pub min_dwell_s: f64,
    /// Velocity scaling policy.
    #[serde(default)]
    pub velocity: VelocityScaling,
    /// Elevation buckets; the built-in table when absent.
    #[serde(default)]
    pub buckets: Option<Vec<ElevationBucket>>,
    /// Fader parameters; the built-in Loo table when absent.
    #[serde(default)]
    pub fader: Option<FaderConf>,
}

fn default_min_dwell_s() -> f64 {
    MarkovConf::DEFAULT_MIN_DWELL_S
}

impl Default for FadingSection {
    fn default() -> Self {
        Self {
            mode: FadingMode::default(),
            initial_state: 0,
            min_dwell_s: default_min_dwell_s(),
            velocity: VelocityScaling::default(),
            buckets: None,
            fader: None,
        }
    }
}

/// Frame table settings.
///
/// Either derived from the DVB-S2 tables at a symbol rate, or listed entry
/// by entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameSection {
    /// Symbol rate used to derive frame durations.
    #[serde(default = "default_symbol_rate_baud")]
    pub symbol_rate_baud: f64,
    /// Whether PLFRAMEs carry pilot blocks.
    #[serde(default = "default_pilots")]
    pub pilots: bool,
    /// Explicit entries replacing the derived table.
    #[serde(default)]
    pub entries: Option<Vec<FrameTableEntry>>,
    /// Dummy frame duration for explicit tables; derived from the symbol rate when absent.
    #[serde(default)]
    pub dummy_duration_us: Option<u64>,
}

fn default_symbol_rate_baud() -> f64 {
    25e6
}

fn default_pilots() -> bool {
    true
}

impl Default for FrameSection {
    fn default() -> Self {
        Self {
            symbol_rate_baud: default_symbol_rate_baud(),
            pilots: default_pilots(),
            entries: None,
            dummy_duration_us: None,
        }
    }
}

/// One explicit frame table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameTableEntry {
    /// MODCOD, e.g. `QPSK_3_TO_4`.
    pub modcod: ModCod,
    /// `SHORT_FRAME` or `NORMAL_FRAME`.
    pub frame_type: BbFrameType,
    /// Payload capacity in bits.
    pub payload_bits: u32,
    /// On-air duration in microseconds.
    pub duration_us: u64,
}

// ============================================================================
// Loading
// ============================================================================

impl SimConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_yaml_str(&text)
    }

    /// Validate every section and build the runtime configuration.
    pub fn build(&self) -> Result<Model> {
        let markov = self.fading.markov_conf()?;
        let frame = self.frame.frame_conf()?;

        if self.fading.mode == FadingMode::Trace && self.trace.is_none() {
            return Err(ModelError::Invalid(
                "trace fading mode needs a trace section".into(),
            ));
        }

        info!(
            seed = self.seed,
            mode = ?self.fading.mode,
            buckets = markov.buckets().len(),
            states = markov.state_count(),
            frame_entries = frame.len(),
            "Configuration validated"
        );

        Ok(Model {
            seed: self.seed,
            fading_mode: self.fading.mode,
            markov,
            frame,
            trace: self.trace.clone(),
        })
    }
}

impl FadingSection {
    /// Validated Markov configuration.
    pub fn markov_conf(&self) -> Result<MarkovConf> {
        let buckets = match &self.buckets {
            Some(buckets) => buckets.clone(),
            None => MarkovConf::default().buckets().to_vec(),
        };
        let fader = self.fader.clone().unwrap_or_default();
        Ok(MarkovConf::new(buckets, fader)?
            .with_initial_state(self.initial_state)?
            .with_velocity_scaling(self.velocity)?
            .with_min_dwell(self.min_dwell_s)?)
    }
}

impl FrameSection {
    /// Validated frame table.
    pub fn frame_conf(&self) -> Result<BbFrameConf> {
        let Some(entries) = &self.entries else {
            return Ok(BbFrameConf::dvb_s2(self.symbol_rate_baud, self.pilots)?);
        };

        let dummy_duration = match self.dummy_duration_us {
            Some(us) => Duration::from_micros(us),
            None => {
                if !(self.symbol_rate_baud.is_finite() && self.symbol_rate_baud > 0.0) {
                    return Err(ModelError::Invalid(format!(
                        "symbol rate {} cannot size the dummy frame",
                        self.symbol_rate_baud
                    )));
                }
                Duration::from_secs_f64(DUMMY_PLFRAME_SYMBOLS as f64 / self.symbol_rate_baud)
            }
        };

        Ok(BbFrameConf::from_entries(
            entries.iter().map(|e| {
                (
                    e.modcod,
                    e.frame_type,
                    FrameEntry {
                        payload_bits: e.payload_bits,
                        duration: Duration::from_micros(e.duration_us),
                    },
                )
            }),
            dummy_duration,
        )?)
    }
}

// ============================================================================
// Runtime configuration
// ============================================================================

/// Validated configuration ready to build simulation components.
#[derive(Debug, Clone)]
pub struct Model {
    /// Base seed.
    pub seed: u64,
    /// Fading source.
    pub fading_mode: FadingMode,
    /// Markov configuration (built even in trace mode).
    pub markov: MarkovConf,
    /// Frame table.
    pub frame: BbFrameConf,
    /// Trace input location.
    pub trace: Option<TraceConfig>,
}

impl Model {
    /// Fading facade for the configured mode.
    pub fn fading_container(&self, inputs: FadingInputs) -> Result<MarkovContainer> {
        match self.fading_mode {
            FadingMode::Markov => Ok(MarkovContainer::new(self.markov.clone(), inputs, self.seed)),
            FadingMode::Trace => {
                let config = self.trace.clone().ok_or_else(|| {
                    ModelError::Invalid("trace fading mode needs a trace section".into())
                })?;
                Ok(MarkovContainer::trace_driven(TraceCache::new(
                    config,
                    TraceKind::Fading,
                ))?)
            }
        }
    }

    /// Interference trace cache, when a trace section is configured.
    pub fn interference_cache(&self) -> Option<TraceCache> {
        self.trace
            .clone()
            .map(|config| TraceCache::new(config, TraceKind::Interference))
    }
}
