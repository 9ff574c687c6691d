//! Post-processing of the concatenated event table.
//!
//! - [`matcher`] attaches auxiliary EMO5 variables by nearest timestamp
//! - [`snow`] blanks measures of events that were likely snowfall

pub mod matcher;
pub mod snow;

pub use matcher::{AuxiliaryData, AuxiliarySeries, MatchDirection, MatchOutcome, match_auxiliary};
pub use snow::{MaskColumn, is_snowfall, mask_snow};
