//! Per-link trace cache with lazy loading.

use crate::{Result, SeriesStatistics, TraceError, TraceKind, TraceSeries};
use satsim_common::LinkKey;
use satsim_metrics::{metric_defs, metrics, LinkLabels};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Trace input configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceConfig {
    /// Simulation root directory; files live in `<root>/<kind>/`.
    pub root: PathBuf,
    /// Restart from the first row instead of failing when a series runs out.
    #[serde(default)]
    pub wrap_around: bool,
}

impl TraceConfig {
    /// Configuration rooted at `root`, without wrap-around.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            wrap_around: false,
        }
    }
}

/// A registered link: where its file lives, the series once loaded, and the cursor.
#[derive(Debug)]
struct TraceEntry {
    path: PathBuf,
    series: Option<TraceSeries>,
    cursor: usize,
}

/// Maps link keys to lazily loaded trace series of one [`TraceKind`].
///
/// Registration only records the binding. The file is read the first time a
/// lookup needs it and never again for the rest of the run.
#[derive(Debug)]
pub struct TraceCache {
    config: TraceConfig,
    kind: TraceKind,
    entries: HashMap<LinkKey, TraceEntry>,
    load_count: usize,
}

impl TraceCache {
    /// Create an empty cache serving traces of `kind`.
    pub fn new(config: TraceConfig, kind: TraceKind) -> Self {
        Self {
            config,
            kind,
            entries: HashMap::new(),
            load_count: 0,
        }
    }

    /// Kind of trace this cache serves.
    pub fn kind(&self) -> TraceKind {
        self.kind
    }

    /// Trace root directory.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Register a link. Returns `false` if it was already registered.
    ///
    /// No file access happens here.
    pub fn register(&mut self, key: LinkKey) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        let path = self.kind.file_path(&self.config.root, &key);
        debug!(link = %key, path = %path.display(), kind = %self.kind, "Registered trace");
        self.entries.insert(
            key,
            TraceEntry {
                path,
                series: None,
                cursor: 0,
            },
        );
        true
    }

    /// Whether `key` has been registered.
    pub fn is_registered(&self, key: &LinkKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether the series for `key` has been read from disk.
    pub fn is_loaded(&self, key: &LinkKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.series.is_some())
    }

    /// Number of registered links.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no links are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files read from disk so far.
    pub fn load_count(&self) -> usize {
        self.load_count
    }

    /// Current cursor position for `key`.
    pub fn cursor(&self, key: &LinkKey) -> Result<usize> {
        self.entries
            .get(key)
            .map(|e| e.cursor)
            .ok_or(TraceError::NotFound { key: *key, kind: self.kind })
    }

    /// The series for `key`, loading it on first access.
    pub fn find(&mut self, key: &LinkKey) -> Result<&TraceSeries> {
        let kind = self.kind;
        let entry = self.entry_loaded(key)?;
        entry
            .series
            .as_ref()
            .ok_or(TraceError::NotFound { key: *key, kind })
    }

    /// Interference density at the cursor; consumes one row.
    pub fn interference_density(&mut self, key: &LinkKey) -> Result<f64> {
        self.expect_kind(TraceKind::Interference)?;
        self.next_value(key, TraceKind::INTERFERENCE_DENSITY_COLUMN)
    }

    /// Rx power density at the cursor; consumes one row.
    pub fn rx_power_density(&mut self, key: &LinkKey) -> Result<f64> {
        self.expect_kind(TraceKind::Interference)?;
        self.next_value(key, TraceKind::RX_POWER_DENSITY_COLUMN)
    }

    /// Fading value (dB) at the cursor; consumes one row.
    pub fn fading_db(&mut self, key: &LinkKey) -> Result<f64> {
        self.expect_kind(TraceKind::Fading)?;
        self.next_value(key, TraceKind::FADING_COLUMN)
    }

    /// The whole row at the cursor; consumes it.
    pub fn next_row(&mut self, key: &LinkKey) -> Result<Vec<f64>> {
        let index = self.advance(key)?;
        let row = self
            .find(key)?
            .row(index)
            .map(<[f64]>::to_vec)
            .unwrap_or_default();
        Ok(row)
    }

    /// Move the cursor forward to the row whose time is closest to `time_s` and return it.
    ///
    /// The cursor never moves backwards and the returned row is not consumed.
    pub fn proceed_to_time(&mut self, key: &LinkKey, time_s: f64) -> Result<Vec<f64>> {
        let kind = self.kind;
        let entry = self.entry_loaded(key)?;
        let series = entry
            .series
            .as_ref()
            .ok_or(TraceError::NotFound { key: *key, kind })?;
        let index = series
            .closest_index_from(entry.cursor, time_s)
            .ok_or(TraceError::SourceExhausted {
                key: *key,
                kind,
                rows: series.len(),
            })?;
        let row = series.row(index).map(<[f64]>::to_vec).unwrap_or_default();
        entry.cursor = index;
        Ok(row)
    }

    /// Summary statistics of one column of the series for `key`.
    pub fn statistics(&mut self, key: &LinkKey, column: usize) -> Result<SeriesStatistics> {
        self.find(key)?.statistics(column)
    }

    /// Rewind the cursor for `key` to the first row.
    pub fn reset(&mut self, key: &LinkKey) -> Result<()> {
        let kind = self.kind;
        let entry = self
            .entries
            .get_mut(key)
            .ok_or(TraceError::NotFound { key: *key, kind })?;
        entry.cursor = 0;
        Ok(())
    }

    /// Rewind every cursor.
    pub fn reset_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.cursor = 0;
        }
    }

    fn expect_kind(&self, requested: TraceKind) -> Result<()> {
        if self.kind != requested {
            return Err(TraceError::WrongKind {
                requested,
                actual: self.kind,
            });
        }
        Ok(())
    }

    fn next_value(&mut self, key: &LinkKey, column: usize) -> Result<f64> {
        let index = self.advance(key)?;
        let series = self.find(key)?;
        series
            .row(index)
            .and_then(|row| row.get(column).copied())
            .ok_or(TraceError::ColumnOutOfRange {
                column,
                columns: series.columns(),
            })
    }

    /// Claim the row at the cursor and move the cursor past it.
    fn advance(&mut self, key: &LinkKey) -> Result<usize> {
        let kind = self.kind;
        let wrap_around = self.config.wrap_around;
        let entry = self.entry_loaded(key)?;
        let rows = entry.series.as_ref().map_or(0, TraceSeries::len);

        if entry.cursor >= rows {
            if wrap_around && rows > 0 {
                debug!(link = %key, kind = %kind, rows, "Trace wrapped to first row");
                entry.cursor = 0;
            } else {
                metrics::counter!(
                    metric_defs::TRACE_EXHAUSTED.name,
                    &LinkLabels::from_key(key).with(&[("kind", kind.to_string())])
                )
                .increment(1);
                return Err(TraceError::SourceExhausted { key: *key, kind, rows });
            }
        }

        let index = entry.cursor;
        entry.cursor += 1;
        Ok(index)
    }

    fn entry_loaded(&mut self, key: &LinkKey) -> Result<&mut TraceEntry> {
        let kind = self.kind;
        let entry = self
            .entries
            .get_mut(key)
            .ok_or(TraceError::NotFound { key: *key, kind })?;

        if entry.series.is_none() {
            let series = TraceSeries::from_file(&entry.path, kind.column_count()).inspect_err(|e| {
                warn!(link = %key, path = %entry.path.display(), error = %e, "Failed to load trace");
            })?;
            debug!(
                link = %key,
                path = %entry.path.display(),
                rows = series.len(),
                "Loaded trace"
            );
            if series.is_empty() {
                warn!(link = %key, path = %entry.path.display(), "Trace file has no samples");
            }
            entry.series = Some(series);
            self.load_count += 1;
            metrics::counter!(
                metric_defs::TRACE_LOADS.name,
                &LinkLabels::from_key(key).with(&[("kind", kind.to_string())])
            )
            .increment(1);
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satsim_common::{ChannelType, MacAddress};

    fn key(index: u64) -> LinkKey {
        LinkKey::new(MacAddress::from_index(index), ChannelType::ForwardUser)
    }

    #[test]
    fn test_register_is_idempotent_and_lazy() {
        let mut cache = TraceCache::new(TraceConfig::new("/nonexistent"), TraceKind::Fading);
        assert!(cache.register(key(1)));
        assert!(!cache.register(key(1)));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_loaded(&key(1)));
        assert_eq!(cache.load_count(), 0);
    }

    #[test]
    fn test_unregistered_key_is_not_found() {
        let mut cache = TraceCache::new(TraceConfig::new("/nonexistent"), TraceKind::Interference);
        assert!(matches!(
            cache.interference_density(&key(9)),
            Err(TraceError::NotFound { .. })
        ));
        assert!(matches!(cache.reset(&key(9)), Err(TraceError::NotFound { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut cache = TraceCache::new(TraceConfig::new("/nonexistent"), TraceKind::Fading);
        cache.register(key(1));
        assert!(matches!(cache.fading_db(&key(1)), Err(TraceError::Io { .. })));
        assert_eq!(cache.load_count(), 0);
    }

    #[test]
    fn test_wrong_kind_lookup() {
        let mut cache = TraceCache::new(TraceConfig::new("/nonexistent"), TraceKind::Fading);
        cache.register(key(1));
        assert!(matches!(
            cache.interference_density(&key(1)),
            Err(TraceError::WrongKind {
                requested: TraceKind::Interference,
                actual: TraceKind::Fading
            })
        ));
    }
}
