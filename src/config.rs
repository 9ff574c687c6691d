//! Configuration management and validation.
//!
//! Provides the event thresholds, matching and snow-mask settings, and
//! output options for a processing run. Defaults reproduce the published
//! EMO5/REDES method; every field can be overridden from the command line.

use crate::constants::{
    CANDIDATE_THRESHOLD_MM, DEFAULT_MATCH_TOLERANCE_HOURS, DEFAULT_RESOLUTION_HOURS,
    EVENT_THRESHOLD_MM, SINGLE_STEP_THRESHOLD_MM, SNOW_TEMPERATURE_THRESHOLD_C,
};
use crate::enrich::matcher::MatchDirection;
use crate::enrich::snow::MaskColumn;
use crate::error::{ErosivityError, Result};
use chrono::TimeDelta;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Depth thresholds (mm) used by event detection and classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventThresholds {
    /// A timestep must exceed this depth to be a candidate
    pub candidate_mm: f64,

    /// Lower bound for single-timestep erosive bursts
    pub single_step_mm: f64,

    /// Total depth at which an event is erosive regardless of duration
    pub event_mm: f64,
}

impl Default for EventThresholds {
    fn default() -> Self {
        Self {
            candidate_mm: CANDIDATE_THRESHOLD_MM,
            single_step_mm: SINGLE_STEP_THRESHOLD_MM,
            event_mm: EVENT_THRESHOLD_MM,
        }
    }
}

/// Settings for attaching auxiliary variables to events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Maximum distance between event start and auxiliary record (hours)
    pub tolerance_hours: i64,

    /// Search direction relative to the event start
    pub direction: MatchDirection,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance_hours: DEFAULT_MATCH_TOLERANCE_HOURS,
            direction: MatchDirection::Nearest,
        }
    }
}

impl MatchingConfig {
    pub fn tolerance(&self) -> TimeDelta {
        TimeDelta::hours(self.tolerance_hours)
    }
}

/// Settings for masking likely snowfall events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowMaskConfig {
    /// Max temperature (°C) at or below which the listed columns are blanked
    pub threshold_c: f64,

    /// Columns to blank
    pub columns: Vec<MaskColumn>,
}

impl Default for SnowMaskConfig {
    fn default() -> Self {
        Self {
            threshold_c: SNOW_TEMPERATURE_THRESHOLD_C,
            columns: vec![MaskColumn::Re],
        }
    }
}

/// Output table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_string_lossy().to_lowercase();
        match extension.as_str() {
            "csv" => Some(OutputFormat::Csv),
            "parquet" | "pq" => Some(OutputFormat::Parquet),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ErosivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(ErosivityError::configuration(format!(
                "Unknown output format '{}' (expected csv or parquet)",
                other
            ))),
        }
    }
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = ErosivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(ErosivityError::configuration(format!(
                "Unknown compression '{}' (expected snappy, zstd, lz4 or none)",
                other
            ))),
        }
    }
}

/// Output table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Explicit format; detected from the output extension when unset
    pub format: Option<OutputFormat>,

    /// Parquet compression (ignored for CSV)
    pub compression: CompressionAlgorithm,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            compression: CompressionAlgorithm::Snappy,
        }
    }
}

impl OutputConfig {
    /// Resolve the format for a path, falling back to CSV
    pub fn resolve_format(&self, path: &Path) -> OutputFormat {
        self.format
            .or_else(|| OutputFormat::from_path(path))
            .unwrap_or(OutputFormat::Csv)
    }
}

/// Global configuration for erosivity processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErosivityConfig {
    /// Accumulation interval of the precipitation series (hours)
    pub resolution_hours: u32,

    /// Event detection and classification thresholds
    pub thresholds: EventThresholds,

    /// Multiplier applied to precipitation values on load
    pub depth_scale: f64,

    /// Auxiliary variable matching
    pub matching: MatchingConfig,

    /// Snow masking
    pub snow_mask: SnowMaskConfig,

    /// Maximum stations evaluated concurrently
    pub workers: usize,

    /// Output table settings
    pub output: OutputConfig,
}

impl Default for ErosivityConfig {
    fn default() -> Self {
        Self {
            resolution_hours: DEFAULT_RESOLUTION_HOURS,
            thresholds: EventThresholds::default(),
            depth_scale: 1.0,
            matching: MatchingConfig::default(),
            snow_mask: SnowMaskConfig::default(),
            workers: num_cpus::get().max(1),
            output: OutputConfig::default(),
        }
    }
}

impl ErosivityConfig {
    /// Accumulation interval as a time delta
    pub fn resolution(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.resolution_hours))
    }

    pub fn with_resolution_hours(mut self, hours: u32) -> Self {
        self.resolution_hours = hours;
        self
    }

    pub fn with_thresholds(mut self, thresholds: EventThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_depth_scale(mut self, scale: f64) -> Self {
        self.depth_scale = scale;
        self
    }

    pub fn with_tolerance_hours(mut self, hours: i64) -> Self {
        self.matching.tolerance_hours = hours;
        self
    }

    pub fn with_direction(mut self, direction: MatchDirection) -> Self {
        self.matching.direction = direction;
        self
    }

    pub fn with_mask_columns(mut self, columns: Vec<MaskColumn>) -> Self {
        self.snow_mask.columns = columns;
        self
    }

    pub fn with_snow_threshold(mut self, threshold_c: f64) -> Self {
        self.snow_mask.threshold_c = threshold_c;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.resolution_hours == 0 {
            return Err(ErosivityError::configuration(
                "Resolution must be at least one hour",
            ));
        }

        if self.matching.tolerance_hours < 0 {
            return Err(ErosivityError::configuration(format!(
                "Match tolerance must not be negative (got {}h)",
                self.matching.tolerance_hours
            )));
        }

        let t = &self.thresholds;
        if !(t.candidate_mm >= 0.0 && t.single_step_mm >= 0.0 && t.event_mm >= 0.0) {
            return Err(ErosivityError::configuration(
                "Event thresholds must be non-negative numbers",
            ));
        }
        if t.single_step_mm > t.event_mm {
            return Err(ErosivityError::configuration(format!(
                "Single-step threshold {} mm exceeds event threshold {} mm",
                t.single_step_mm, t.event_mm
            )));
        }

        if !(self.depth_scale.is_finite() && self.depth_scale > 0.0) {
            return Err(ErosivityError::configuration(format!(
                "Depth scale must be a positive number (got {})",
                self.depth_scale
            )));
        }

        if !self.snow_mask.threshold_c.is_finite() {
            return Err(ErosivityError::configuration(
                "Snow threshold must be a finite temperature",
            ));
        }

        if self.workers == 0 {
            return Err(ErosivityError::configuration(
                "At least one worker is required",
            ));
        }

        debug!(
            "Configuration validated: resolution={}h, tolerance={}h, direction={:?}, workers={}",
            self.resolution_hours,
            self.matching.tolerance_hours,
            self.matching.direction,
            self.workers
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let config = ErosivityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution_hours, 6);
        assert_eq!(config.resolution(), TimeDelta::hours(6));
        assert_eq!(config.matching.tolerance(), TimeDelta::hours(24));
        assert_eq!(config.snow_mask.columns, vec![MaskColumn::Re]);
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let config = ErosivityConfig::default().with_resolution_hours(0);
        assert!(matches!(
            config.validate(),
            Err(ErosivityError::Configuration { .. })
        ));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = ErosivityConfig::default().with_tolerance_hours(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_depth_scale_rejected() {
        assert!(ErosivityConfig::default().with_depth_scale(0.0).validate().is_err());
        assert!(ErosivityConfig::default().with_depth_scale(f64::NAN).validate().is_err());
        assert!(ErosivityConfig::default().with_depth_scale(0.25).validate().is_ok());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let thresholds = EventThresholds {
            single_step_mm: 20.0,
            ..Default::default()
        };
        let config = ErosivityConfig::default().with_thresholds(thresholds);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(ErosivityConfig::default().with_workers(0).validate().is_err());
    }

    #[test]
    fn test_output_format_detection() {
        let output = OutputConfig::default();
        assert_eq!(
            output.resolve_format(&PathBuf::from("events.parquet")),
            OutputFormat::Parquet
        );
        assert_eq!(
            output.resolve_format(&PathBuf::from("events.CSV")),
            OutputFormat::Csv
        );
        assert_eq!(
            output.resolve_format(&PathBuf::from("events")),
            OutputFormat::Csv
        );

        let forced = OutputConfig {
            format: Some(OutputFormat::Parquet),
            ..Default::default()
        };
        assert_eq!(
            forced.resolve_format(&PathBuf::from("events.csv")),
            OutputFormat::Parquet
        );
    }

    #[test]
    fn test_compression_parsing() {
        assert_eq!(
            "snappy".parse::<CompressionAlgorithm>().unwrap(),
            CompressionAlgorithm::Snappy
        );
        assert_eq!(
            "NONE".parse::<CompressionAlgorithm>().unwrap(),
            CompressionAlgorithm::Uncompressed
        );
        assert!("brotli".parse::<CompressionAlgorithm>().is_err());
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }
}
