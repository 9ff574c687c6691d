//! EMO Erosivity Library
//!
//! A Rust library for deriving EI30 rainfall erosivity events from EMO5
//! sub-daily precipitation at REDES stations.
//!
//! This library provides tools for:
//! - Segmenting precipitation series into rainfall events
//! - Classifying erosive events by depth and duration
//! - Estimating event erosivity from monthly, zone-specific power laws
//! - Attaching auxiliary EMO5 variables by nearest timestamp
//! - Masking likely snowfall events
//! - Writing the event table as CSV or Parquet

pub mod cli;
pub mod config;
pub mod constants;
pub mod enrich;
pub mod erosivity;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod processor;

// Re-export commonly used types
pub use config::ErosivityConfig;
pub use error::{ErosivityError, Result};
pub use models::{ErosivityEvent, Event, ProcessingStats, SkippedStation, Station};
pub use pipeline::{PipelineInputs, PipelineOutput, run};
pub use processor::ErosivityProcessor;
