//! Concurrent station evaluation.
//!
//! Each station is segmented, classified and estimated on the blocking
//! pool. Results come back in reference-table order regardless of how
//! many stations run at once, so the output table is deterministic.

use crate::config::ErosivityConfig;
use crate::error::Result;
use crate::pipeline::{PipelineInputs, StationEvents, process_station, station_series};

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error};

/// Runs the per-station stage with bounded concurrency
#[derive(Debug, Clone)]
pub struct StationProcessor {
    config: ErosivityConfig,
}

impl StationProcessor {
    pub fn new(config: ErosivityConfig) -> Self {
        Self { config }
    }

    fn progress_bar(len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("Processing stations");
        pb
    }

    /// Evaluate every reference station; the first failing station aborts the run
    pub async fn process_stations(&self, inputs: Arc<PipelineInputs>) -> Result<Vec<StationEvents>> {
        let station_count = inputs.stations.len();
        let concurrent_limit = self.config.workers.min(station_count).max(1);
        debug!(
            "Evaluating {} stations with {} workers",
            station_count, concurrent_limit
        );

        let pb = Self::progress_bar(station_count);

        let results = stream::iter(0..station_count)
            .map(|index| {
                let inputs = Arc::clone(&inputs);
                let config = self.config.clone();
                let pb = pb.clone();
                async move {
                    let result = task::spawn_blocking(move || -> Result<StationEvents> {
                        let station = &inputs.stations[index];
                        let series = station_series(&inputs.precipitation, station)?;
                        Ok(process_station(
                            station,
                            &series,
                            &inputs.parameters,
                            &config,
                        ))
                    })
                    .await?;

                    pb.inc(1);
                    if let Err(e) = &result {
                        error!("{}", e);
                    }
                    result
                }
            })
            .buffered(concurrent_limit)
            .try_collect::<Vec<_>>()
            .await;

        match &results {
            Ok(_) => pb.finish_with_message("All stations processed"),
            Err(_) => pb.abandon_with_message("Station processing failed"),
        }

        results
    }
}
