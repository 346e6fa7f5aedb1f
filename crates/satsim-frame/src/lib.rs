//! # satsim-frame
//!
//! BBFrame assembly for the forward link.
//!
//! A [`BbFrame`] is sized from a [`BbFrameConf`] table keyed by
//! [`ModCod`] and [`BbFrameType`]. Link-layer schedulers create a frame for
//! the MODCOD chosen for a terminal and offer payload units until
//! [`BbFrame::add_payload`] reports [`FrameError::CapacityExceeded`].

mod conf;
mod error;
mod frame;
mod modcod;

pub use conf::{
    BbFrameConf, FrameEntry, BBHEADER_BITS, DUMMY_PLFRAME_SYMBOLS, PILOT_BLOCK_SYMBOLS,
    PILOT_PERIOD_SLOTS, PLHEADER_SYMBOLS, SLOT_SYMBOLS,
};
pub use error::FrameError;
pub use frame::BbFrame;
pub use modcod::{BbFrameType, ModCod, Modulation};

/// Result type for frame operations.
pub type Result<T> = std::result::Result<T, FrameError>;
