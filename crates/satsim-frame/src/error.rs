//! Error types for frame assembly.

use crate::{BbFrameType, ModCod};
use thiserror::Error;

/// Errors that can occur when configuring or filling frames.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// A frame type value outside short, normal and dummy.
    #[error("Invalid BBFrame type: {0}")]
    InvalidFrameType(String),

    /// A MODCOD name or index that does not exist.
    #[error("Unknown MODCOD: {0}")]
    UnknownModCod(String),

    /// The frame table has no entry for this combination.
    #[error("No frame entry for {modcod} {frame_type}")]
    MissingEntry {
        /// Requested MODCOD.
        modcod: ModCod,
        /// Requested frame type.
        frame_type: BbFrameType,
    },

    /// The payload unit does not fit the remaining capacity.
    #[error("Payload of {requested} bytes exceeds {available} bytes left in frame")]
    CapacityExceeded {
        /// Size of the rejected unit.
        requested: usize,
        /// Bytes still free in the frame.
        available: u32,
    },

    /// Other invalid frame table input.
    #[error("Invalid frame configuration: {0}")]
    Configuration(String),
}
