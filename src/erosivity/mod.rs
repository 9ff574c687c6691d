//! EI30 event detection and erosivity estimation.
//!
//! The three stages run per station, in order:
//! - [`segment`] groups candidate timesteps into events
//! - [`classify`] keeps the erosive ones
//! - [`estimate`] applies the monthly power law from [`params`]

pub mod classify;
pub mod estimate;
pub mod params;
pub mod segment;

pub use classify::{is_erosive, select_erosive};
pub use estimate::{erosivity, estimate_events};
pub use params::{MonthlyParameters, MonthlyValues, ParameterSet, ParameterTable, PowerLaw};
pub use segment::segment_events;
