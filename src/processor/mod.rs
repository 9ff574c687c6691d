//! Main processing engine.
//!
//! Orchestrates a complete erosivity run: loading the input tables,
//! evaluating stations concurrently, enriching the concatenated event
//! table, and writing the results.

pub mod stations;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{
    stations::StationProcessor,
    writer::{EventWriter, write_skipped_report},
};

use crate::config::ErosivityConfig;
use crate::error::{ErosivityError, Result};
use crate::loader::{InputPaths, load_inputs};
use crate::models::ProcessingStats;
use crate::pipeline::finalize;

use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::info;

/// Main processor for erosivity event extraction
#[derive(Debug)]
pub struct ErosivityProcessor {
    inputs: InputPaths,
    output_path: PathBuf,
    skipped_report: Option<PathBuf>,
    config: ErosivityConfig,
    station_processor: StationProcessor,
    event_writer: EventWriter,
}

impl ErosivityProcessor {
    /// Create a new processor; every input file must exist
    pub fn new(inputs: InputPaths, output_path: PathBuf) -> Result<Self> {
        if let Some(missing) = inputs.all().into_iter().find(|path| !path.exists()) {
            return Err(ErosivityError::InputNotFound {
                path: missing.to_path_buf(),
            });
        }

        let config = ErosivityConfig::default();

        Ok(Self {
            inputs,
            output_path: output_path.clone(),
            skipped_report: None,
            station_processor: StationProcessor::new(config.clone()),
            event_writer: EventWriter::new(output_path, config.output.clone()),
            config,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: ErosivityConfig) -> Self {
        self.station_processor = StationProcessor::new(config.clone());
        self.event_writer = EventWriter::new(self.output_path.clone(), config.output.clone());
        self.config = config;
        self
    }

    /// Also write the stations skipped during matching to a CSV report
    pub fn with_skipped_report(mut self, path: PathBuf) -> Self {
        self.skipped_report = Some(path);
        self
    }

    /// Main processing entry point
    pub async fn process(&mut self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;

        println!("{}", "Starting erosivity processing".bright_green().bold());
        println!(
            "  {} {}",
            "Precipitation:".bright_cyan(),
            self.inputs.precipitation.display()
        );
        println!(
            "  {} {}",
            "Output:".bright_cyan(),
            self.output_path.display()
        );

        // Step 1: Load inputs
        println!("\n{}", "Loading input tables...".bright_yellow());
        let paths = self.inputs.clone();
        let config = self.config.clone();
        let inputs = task::spawn_blocking(move || load_inputs(&paths, &config)).await??;
        println!(
            "  {} {} reference stations, {} precipitation columns over {} timesteps",
            "Loaded".bright_green(),
            inputs.stations.len().to_string().bright_white().bold(),
            inputs.precipitation.station_count().to_string().bright_white(),
            inputs.precipitation.timestamps.len().to_string().bright_white()
        );
        match &inputs.auxiliary {
            Some(auxiliary) => println!(
                "  {} auxiliary series for {} stations",
                "Loaded".bright_green(),
                auxiliary.len().to_string().bright_white()
            ),
            None => println!(
                "  {}",
                "No auxiliary data: matching and snow mask disabled".bright_yellow()
            ),
        }

        // Step 2: Evaluate stations
        println!("\n{}", "Processing stations...".bright_yellow());
        let inputs = Arc::new(inputs);
        let results = self
            .station_processor
            .process_stations(Arc::clone(&inputs))
            .await?;

        // Step 3: Match auxiliary data and apply the snow mask
        let output = finalize(results, inputs.auxiliary.as_ref(), &self.config);
        let mut stats = output.stats;

        // Step 4: Write results
        println!("\n{}", "Writing event table...".bright_yellow());
        let writer = self.event_writer.clone();
        let events = output.events;
        stats.rows_written = task::spawn_blocking(move || writer.write(&events)).await??;
        stats.output_path = self.output_path.clone();

        if let Some(report_path) = &self.skipped_report {
            write_skipped_report(report_path, &output.skipped)?;
            info!("Skipped-station report written to {}", report_path.display());
        }

        let total_time = start_time.elapsed().as_millis();
        println!("\n{}", "Processing Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            total_time.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Stations processed:".bright_cyan(),
            stats.stations_processed.to_string().bright_white()
        );
        println!(
            "  {} {} candidate, {} erosive",
            "Events:".bright_cyan(),
            stats.candidate_events.to_string().bright_white(),
            stats.erosive_events.to_string().bright_white().bold()
        );
        if stats.stations_missing_parameters > 0 {
            println!(
                "  {} {}",
                "Stations without parameters:".bright_red(),
                stats.stations_missing_parameters.to_string().bright_red()
            );
        }
        if inputs.auxiliary.is_some() {
            println!(
                "  {} {} matched, {} snow-masked",
                "Auxiliary:".bright_cyan(),
                stats.events_matched.to_string().bright_white(),
                stats.events_masked.to_string().bright_white()
            );
        }
        if stats.stations_skipped > 0 {
            println!(
                "  {} {}",
                "Stations skipped:".bright_red(),
                stats.stations_skipped.to_string().bright_red().bold()
            );
        }
        println!(
            "  {} {}",
            "Rows written:".bright_cyan(),
            stats.rows_written.to_string().bright_white().bold()
        );

        Ok(ProcessingStats {
            processing_time_ms: total_time,
            ..stats
        })
    }
}
