//! # satsim-common
//!
//! Common types shared by the satellite link simulator crates.
//!
//! - [`SimTime`] - Simulation time with microsecond resolution
//! - [`MacAddress`], [`ChannelType`], [`LinkKey`] - Link identity
//! - [`Timeline`] - Discrete-event queue ordered by time and insertion sequence

mod error;
mod link;
mod time;
pub mod timeline;

pub use error::CommonError;
pub use link::{ChannelType, LinkKey, MacAddress};
pub use time::SimTime;
pub use timeline::{EventId, Timeline, TimelineError};
