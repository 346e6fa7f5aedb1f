//! Error types for the trace crate.

use crate::TraceKind;
use satsim_common::LinkKey;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with input traces.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The link was never registered with the cache.
    #[error("No {kind} trace registered for link {key}")]
    NotFound {
        /// Requested link.
        key: LinkKey,
        /// Kind of trace the cache serves.
        kind: TraceKind,
    },

    /// The series has no further samples.
    #[error("{kind} trace for link {key} exhausted after {rows} rows")]
    SourceExhausted {
        /// Requested link.
        key: LinkKey,
        /// Kind of trace the cache serves.
        kind: TraceKind,
        /// Number of rows in the series.
        rows: usize,
    },

    /// I/O error reading a trace file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A row could not be parsed.
    #[error("Parse error in {path} line {line}: {reason}")]
    Parse {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A column index outside the series was requested.
    #[error("Column {column} out of range (series has {columns} columns)")]
    ColumnOutOfRange {
        /// Requested column.
        column: usize,
        /// Number of columns in the series.
        columns: usize,
    },

    /// A lookup was issued against a cache serving a different kind of trace.
    #[error("{requested} lookup issued against a {actual} trace cache")]
    WrongKind {
        /// Kind the lookup needs.
        requested: TraceKind,
        /// Kind the cache serves.
        actual: TraceKind,
    },
}
