//! Metrics declarations for the satellite link simulator.
//!
//! Every metric the simulator emits is declared once here as a [`Metric`]
//! constant, so names and units cannot drift between emitters. The `metrics`
//! crate is re-exported; without an installed recorder all emission is a no-op.
//!
//! ```rust,ignore
//! use satsim_metrics::{metric_defs, LinkLabels};
//!
//! let labels = LinkLabels::from_key(&key).to_labels();
//! metrics::histogram!(metric_defs::FADING_SAMPLE_DB.name, &labels).record(-3.2);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use satsim_common::LinkKey;

/// How a metric is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Only ever incremented.
    Counter,
    /// Set to the latest value.
    Gauge,
    /// Distribution of recorded samples.
    Histogram,
}

impl MetricKind {
    /// Lowercase name, as printed by `satsim metrics`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name, kind and metadata of one emitted metric.
///
/// ```rust
/// use satsim_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES_SENT: Metric = Metric::counter("satsim.frame.sent")
///     .with_description("Frames handed to the physical layer")
///     .with_unit(Unit::Count)
///     .with_labels(&["modcod"]);
///
/// assert_eq!(FRAMES_SENT.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "satsim.fading.sample_db").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn with_kind(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new counter metric.
    pub const fn counter(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Counter)
    }

    /// Creates a new gauge metric.
    pub const fn gauge(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Gauge)
    }

    /// Creates a new histogram metric.
    pub const fn histogram(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Histogram)
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// Every metric the simulator emits.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on every link-scoped metric.
    pub const LINK_LABELS: &[&str] = &["address", "channel"];

    /// Labels on frame metrics.
    pub const FRAME_LABELS: &[&str] = &["modcod", "frame_type"];

    // ========================================================================
    // Fading
    // ========================================================================

    /// Fading samples returned to callers.
    pub const FADING_SAMPLE_DB: Metric = Metric::histogram("satsim.fading.sample_db")
        .with_description("Fading sample returned for a link, in dB")
        .with_labels(LINK_LABELS);

    /// Markov state changes.
    pub const FADING_STATE_TRANSITIONS: Metric = Metric::counter("satsim.fading.state_transitions")
        .with_description("Markov fading state changes (self-transitions excluded)")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Fading models created.
    pub const FADING_MODELS_CREATED: Metric = Metric::counter("satsim.fading.models_created")
        .with_description("Per-link fading models created on first request")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    // ========================================================================
    // Trace input
    // ========================================================================

    /// Trace files loaded from disk.
    pub const TRACE_LOADS: Metric = Metric::counter("satsim.trace.loads")
        .with_description("Trace series loaded from disk (at most once per link)")
        .with_unit(Unit::Count)
        .with_labels(&["address", "channel", "kind"]);

    /// Lookups that hit the end of a series.
    pub const TRACE_EXHAUSTED: Metric = Metric::counter("satsim.trace.exhausted")
        .with_description("Derived trace lookups that found no further samples")
        .with_unit(Unit::Count)
        .with_labels(&["address", "channel", "kind"]);

    // ========================================================================
    // Frames
    // ========================================================================

    /// Frame fill ratio when the frame is consumed for transmission.
    pub const FRAME_FILL_RATIO: Metric = Metric::histogram("satsim.frame.fill_ratio")
        .with_description("Fraction of the frame payload capacity in use when transmitted")
        .with_unit(Unit::Percent)
        .with_labels(FRAME_LABELS);

    /// Payload units rejected for lack of space.
    pub const FRAME_CAPACITY_EXCEEDED: Metric = Metric::counter("satsim.frame.capacity_exceeded")
        .with_description("Payload units rejected because they did not fit the frame")
        .with_unit(Unit::Count)
        .with_labels(FRAME_LABELS);

    /// Registry walked by [`describe_metrics`](crate::describe_metrics).
    pub const ALL: &[&Metric] = &[
        &FADING_SAMPLE_DB,
        &FADING_STATE_TRANSITIONS,
        &FADING_MODELS_CREATED,
        &TRACE_LOADS,
        &TRACE_EXHAUSTED,
        &FRAME_FILL_RATIO,
        &FRAME_CAPACITY_EXCEEDED,
    ];
}

/// Labels identifying a link in metrics.
#[derive(Debug, Clone)]
pub struct LinkLabels {
    /// Link address in text form.
    pub address: String,
    /// Channel type name.
    pub channel: &'static str,
}

impl LinkLabels {
    /// Build labels for a link key.
    pub fn from_key(key: &LinkKey) -> Self {
        Self {
            address: key.address.to_string(),
            channel: key.channel.name(),
        }
    }

    /// Label pairs for the `metrics` macros.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("address", self.address.clone()),
            ("channel", self.channel.to_string()),
        ]
    }

    /// Link labels followed by `extra`.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Register descriptions and units of every metric in [`metric_defs::ALL`].
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
