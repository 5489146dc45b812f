//! Core record types, units, and classification helpers for aviation
//! weather bulletins.
//!
//! This crate holds the plain data model shared by the decoders, the
//! sinks and the HTTP front-end. It performs no I/O.

pub mod briefing;
pub mod category;
pub mod pipeline;
pub mod summary;
pub mod time;
pub mod types;
pub mod units;

pub use briefing::{metar_text, taf_text, upper_wind_for, upper_wind_text, StationBriefing};
pub use category::*;
pub use pipeline::*;
pub use time::*;
pub use types::*;
pub use units::*;
