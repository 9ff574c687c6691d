//! Event table writing.
//!
//! Builds a Polars DataFrame from the final event rows in output column
//! order and writes it as CSV or Parquet. The skipped-station report is
//! always CSV.

use crate::config::{OutputConfig, OutputFormat};
use crate::constants::{OUTPUT_TIMESTAMP_FORMAT, output_columns};
use crate::error::Result;
use crate::models::{ErosivityEvent, SkippedStation};

use polars::prelude::{
    Column, CsvWriter, DataFrame, ParquetWriter as PolarsParquetWriter, SerWriter,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build the event table in output column order
pub fn events_to_dataframe(events: &[ErosivityEvent]) -> Result<DataFrame> {
    let optional = |name: &str, f: fn(&ErosivityEvent) -> Option<f64>| {
        Column::new(name.into(), events.iter().map(f).collect::<Vec<_>>())
    };
    let text = |name: &str, f: fn(&ErosivityEvent) -> String| {
        Column::new(name.into(), events.iter().map(f).collect::<Vec<_>>())
    };

    let columns = vec![
        Column::new(
            output_columns::STATION_ID.into(),
            events.iter().map(|e| e.station_id).collect::<Vec<_>>(),
        ),
        text(output_columns::ENS_NAME, |e| e.ens_name.clone()),
        text(output_columns::ENZ, |e| e.enz.clone()),
        text(output_columns::START, |e| {
            e.start.format(OUTPUT_TIMESTAMP_FORMAT).to_string()
        }),
        text(output_columns::END, |e| {
            e.end.format(OUTPUT_TIMESTAMP_FORMAT).to_string()
        }),
        optional(output_columns::DURATION, |e| e.duration_hours),
        optional(output_columns::DEPTH, |e| e.depth_mm),
        optional(output_columns::RE, |e| e.re),
        optional(output_columns::ALPHA, |e| e.alpha),
        optional(output_columns::BETA, |e| e.beta),
        optional(output_columns::PRECIP_DURATION, |e| e.aux.precip_duration),
        optional(output_columns::RAIN_GAUGE, |e| e.aux.rain_gauge),
        optional(output_columns::MIN_TEMP, |e| e.aux.min_temp),
        optional(output_columns::MAX_TEMP, |e| e.aux.max_temp),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Build the skipped-station report
pub fn skipped_to_dataframe(skipped: &[SkippedStation]) -> Result<DataFrame> {
    let columns = vec![
        Column::new(
            output_columns::STATION_ID.into(),
            skipped.iter().map(|s| s.station_id).collect::<Vec<_>>(),
        ),
        Column::new(
            "Reason".into(),
            skipped.iter().map(|s| s.reason.clone()).collect::<Vec<_>>(),
        ),
    ];

    Ok(DataFrame::new(columns)?)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    create_parent(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Writer for the final event table
#[derive(Debug, Clone)]
pub struct EventWriter {
    output_path: PathBuf,
    config: OutputConfig,
}

impl EventWriter {
    pub fn new(output_path: PathBuf, config: OutputConfig) -> Self {
        Self {
            output_path,
            config,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.config.resolve_format(&self.output_path)
    }

    /// Write the event table, returning the number of rows written
    pub fn write(&self, events: &[ErosivityEvent]) -> Result<usize> {
        let mut df = events_to_dataframe(events)?;
        let rows = df.height();

        match self.format() {
            OutputFormat::Csv => write_csv(&self.output_path, &mut df)?,
            OutputFormat::Parquet => {
                create_parent(&self.output_path)?;
                let file = File::create(&self.output_path)?;
                PolarsParquetWriter::new(file)
                    .with_compression(self.config.compression.to_polars_compression())
                    .finish(&mut df)?;
            }
        }

        info!(
            "Wrote {} events to {} ({:?})",
            rows,
            self.output_path.display(),
            self.format()
        );

        Ok(rows)
    }
}

/// Write the skipped-station report as CSV
pub fn write_skipped_report(path: &Path, skipped: &[SkippedStation]) -> Result<()> {
    let mut df = skipped_to_dataframe(skipped)?;
    write_csv(path, &mut df)?;
    debug!(
        "Wrote {} skipped stations to {}",
        skipped.len(),
        path.display()
    );
    Ok(())
}
