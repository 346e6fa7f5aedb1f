//! # satsim-trace
//!
//! Input traces for the satellite link simulator.
//!
//! Measured interference, received power and fading series are stored as
//! plain numeric text files, one file per link and channel. The
//! [`TraceCache`] indexes links on registration and loads a file only the
//! first time a lookup needs it. Each derived lookup consumes one row at the
//! link's cursor, so repeated calls walk the series in file order.
//!
//! ## File layout
//!
//! ```text
//! <root>/interference/addr_000000000001_ch_FORWARD_USER_CH.dat
//! <root>/fading/addr_000000000001_ch_FORWARD_USER_CH.dat
//! ```
//!
//! Rows are whitespace or comma separated. The first column is the sample
//! time in seconds; `#` starts a comment.
//!
//! ## Example
//!
//! ```no_run
//! use satsim_common::{ChannelType, LinkKey, MacAddress};
//! use satsim_trace::{TraceCache, TraceConfig, TraceKind};
//!
//! let mut cache = TraceCache::new(TraceConfig::new("sim_root"), TraceKind::Interference);
//! let key = LinkKey::new(MacAddress::from_index(1), ChannelType::ForwardUser);
//! cache.register(key);  // no I/O yet
//!
//! let density = cache.interference_density(&key)?;  // loads the file, consumes row 0
//! # Ok::<(), satsim_trace::TraceError>(())
//! ```

mod cache;
mod error;
mod kind;
mod series;

pub use cache::{TraceCache, TraceConfig};
pub use error::TraceError;
pub use kind::TraceKind;
pub use series::{SeriesStatistics, TraceSeries};

/// Result type for trace operations.
pub type Result<T> = std::result::Result<T, TraceError>;
