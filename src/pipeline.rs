//! Pure erosivity pipeline over in-memory inputs.
//!
//! [`process_station`] runs segmentation, classification and estimation for
//! one station. [`finalize`] concatenates the per-station results in
//! reference order, then runs auxiliary matching and the snow mask once.
//! [`run`] chains the two sequentially; the CLI processor runs the station
//! stage concurrently and shares [`finalize`].

use crate::config::ErosivityConfig;
use crate::constants::station_column;
use crate::enrich::{AuxiliaryData, mask_snow, match_auxiliary};
use crate::erosivity::{ParameterSet, estimate_events, segment_events, select_erosive};
use crate::error::{ErosivityError, Result};
use crate::models::{
    ErosivityEvent, PrecipitationSeries, PrecipitationTable, ProcessingStats, SkippedStation,
    Station,
};
use tracing::{debug, info};

/// Everything a run needs, already loaded
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub precipitation: PrecipitationTable,
    pub stations: Vec<Station>,
    pub parameters: ParameterSet,
    /// `None` skips matching and snow masking
    pub auxiliary: Option<AuxiliaryData>,
}

/// Erosive events of one station
#[derive(Debug, Clone, Default)]
pub struct StationEvents {
    pub station_id: i64,
    pub events: Vec<ErosivityEvent>,
    pub candidate_events: usize,
    pub parameters_missing: bool,
}

/// The final event table and what was left out of it
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub events: Vec<ErosivityEvent>,
    pub skipped: Vec<SkippedStation>,
    pub stats: ProcessingStats,
}

/// Look up a station's precipitation column
pub fn station_series(
    precipitation: &PrecipitationTable,
    station: &Station,
) -> Result<PrecipitationSeries> {
    precipitation
        .series(station.station_id)
        .ok_or_else(|| ErosivityError::StationFailed {
            station_id: station.station_id,
            reason: format!(
                "precipitation table has no column '{}'",
                station_column(station.station_id)
            ),
        })
}

/// Segment, classify and estimate one station
pub fn process_station(
    station: &Station,
    series: &PrecipitationSeries,
    parameters: &ParameterSet,
    config: &ErosivityConfig,
) -> StationEvents {
    let resolution = config.resolution();

    let events = segment_events(series, resolution, config.thresholds.candidate_mm);
    let candidate_events = events.len();
    let erosive = select_erosive(events, resolution, &config.thresholds);

    let monthly = parameters.monthly_for(&station.ens_name);
    let events = estimate_events(station, &erosive, &monthly);

    debug!(
        "Station {} ({}): {} candidate events, {} erosive",
        station.station_id,
        station.ens_name,
        candidate_events,
        events.len()
    );

    StationEvents {
        station_id: station.station_id,
        events,
        candidate_events,
        parameters_missing: monthly.is_unusable(),
    }
}

/// Concatenate station results, then match auxiliary data and mask snow
pub fn finalize(
    results: Vec<StationEvents>,
    auxiliary: Option<&AuxiliaryData>,
    config: &ErosivityConfig,
) -> PipelineOutput {
    let mut stats = ProcessingStats {
        stations_processed: results.len(),
        ..Default::default()
    };

    let total_events: usize = results.iter().map(|r| r.events.len()).sum();
    let mut events = Vec::with_capacity(total_events);

    for result in results {
        stats.candidate_events += result.candidate_events;
        stats.erosive_events += result.events.len();
        if result.events.is_empty() {
            stats.stations_without_events += 1;
        }
        if result.parameters_missing {
            stats.stations_missing_parameters += 1;
        }
        events.extend(result.events);
    }

    let (events, skipped) = match auxiliary {
        Some(auxiliary) => {
            let outcome = match_auxiliary(events, auxiliary, &config.matching);
            let mut events = outcome.events;
            stats.events_matched = outcome.matched;
            stats.events_masked = mask_snow(
                &mut events,
                &config.snow_mask.columns,
                config.snow_mask.threshold_c,
            );
            (events, outcome.skipped)
        }
        None => {
            info!("No auxiliary data supplied; skipping matching and snow mask");
            (events, Vec::new())
        }
    };

    stats.stations_skipped = skipped.len();

    PipelineOutput {
        events,
        skipped,
        stats,
    }
}

/// Run the whole pipeline sequentially
pub fn run(inputs: &PipelineInputs, config: &ErosivityConfig) -> Result<PipelineOutput> {
    config.validate()?;

    let results = inputs
        .stations
        .iter()
        .map(|station| {
            let series = station_series(&inputs.precipitation, station)?;
            Ok(process_station(station, &series, &inputs.parameters, config))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(finalize(results, inputs.auxiliary.as_ref(), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{AuxiliarySeries, MaskColumn};
    use crate::erosivity::{MonthlyValues, ParameterTable};
    use crate::models::{AuxiliaryRecord, AuxiliaryValues, Timestamp};
    use crate::processor::writer::EventWriter;
    use chrono::{NaiveDate, TimeDelta};
    use tempfile::TempDir;

    fn origin() -> Timestamp {
        NaiveDate::from_ymd_opt(2018, 7, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    fn step(i: usize) -> Timestamp {
        origin() + TimeDelta::hours(6 * i as i64)
    }

    fn inputs() -> PipelineInputs {
        let mut precipitation = PrecipitationTable::new((0..8).map(step).collect());
        // Station 1: one 8 mm burst, then a 14 mm two-step event
        precipitation.insert(
            1,
            vec![
                Some(8.0),
                Some(0.0),
                Some(0.0),
                Some(7.0),
                Some(7.0),
                Some(0.0),
                Some(0.0),
                Some(0.0),
            ],
        );
        // Station 2: nothing erosive
        precipitation.insert(2, vec![Some(5.0), Some(0.0), None, None, None, None, None, None]);

        let mut alpha = ParameterTable::new();
        alpha.insert("MDN3", MonthlyValues::new([Some(2.0); 12]));
        let mut beta = ParameterTable::new();
        beta.insert("MDN3", MonthlyValues::new([Some(1.0); 12]));

        PipelineInputs {
            precipitation,
            stations: vec![Station::new(1, "MDN3"), Station::new(2, "MDN3")],
            parameters: ParameterSet::new(alpha, beta),
            auxiliary: None,
        }
    }

    #[test]
    fn test_run_without_auxiliary() {
        let output = run(&inputs(), &ErosivityConfig::default()).unwrap();

        assert_eq!(output.events.len(), 2);
        assert!(output.skipped.is_empty());

        let burst = &output.events[0];
        assert_eq!(burst.depth_mm, Some(8.0));
        assert_eq!(burst.duration_hours, Some(6.0));
        assert_eq!(burst.re, Some(16.0));
        assert_eq!(burst.start, step(0) - TimeDelta::hours(6));

        let long = &output.events[1];
        assert_eq!(long.depth_mm, Some(14.0));
        assert_eq!(long.duration_hours, Some(12.0));
        assert_eq!(long.re, Some(28.0));

        assert_eq!(output.stats.stations_processed, 2);
        assert_eq!(output.stats.stations_without_events, 1);
        assert_eq!(output.stats.candidate_events, 3);
        assert_eq!(output.stats.erosive_events, 2);
    }

    #[test]
    fn test_missing_precipitation_column_is_fatal() {
        let mut inputs = inputs();
        inputs.stations.push(Station::new(99, "MDN3"));

        let result = run(&inputs, &ErosivityConfig::default());
        assert!(matches!(
            result,
            Err(ErosivityError::StationFailed { station_id: 99, .. })
        ));
    }

    #[test]
    fn test_unknown_zone_degrades_to_missing_re() {
        let mut inputs = inputs();
        inputs.stations[0] = Station::new(1, "UNK1");

        let output = run(&inputs, &ErosivityConfig::default()).unwrap();
        assert_eq!(output.events.len(), 2);
        assert!(output.events.iter().all(|e| e.re.is_none()));
        assert_eq!(output.stats.stations_missing_parameters, 1);
    }

    #[test]
    fn test_auxiliary_enrichment_and_snow_mask() {
        let mut inputs = inputs();
        let cold = AuxiliaryValues {
            precip_duration: Some(4.0),
            rain_gauge: Some(6.0),
            min_temp: Some(-6.0),
            max_temp: Some(0.5),
        };
        let mut auxiliary = AuxiliaryData::new();
        auxiliary.insert(
            1,
            AuxiliarySeries::new(vec![AuxiliaryRecord {
                timestamp: step(0),
                values: cold,
            }]),
        );
        inputs.auxiliary = Some(auxiliary);
        inputs.stations.push(Station::new(3, "MDN3"));
        let mut depths = vec![None; 8];
        depths[0] = Some(20.0);
        inputs.precipitation.insert(3, depths);

        let config = ErosivityConfig::default().with_mask_columns(vec![MaskColumn::Re]);
        let output = run(&inputs, &config).unwrap();

        // Station 1 burst matches the cold record (6h away) and is masked
        assert_eq!(output.events[0].aux, cold);
        assert_eq!(output.events[0].re, None);
        assert_eq!(output.events[0].depth_mm, Some(8.0));

        // The second event starts 12h after the only record
        assert_eq!(output.events[1].aux, cold);

        // Station 3 has no auxiliary data
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].station_id, 3);
        assert_eq!(output.events[2].re, Some(40.0));

        assert_eq!(output.stats.events_matched, 2);
        assert_eq!(output.stats.events_masked, 2);
        assert_eq!(output.stats.stations_skipped, 1);
    }

    #[test]
    fn test_run_output_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let config = ErosivityConfig::default();

        let written: Vec<Vec<u8>> = ["first.csv", "second.csv"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                let output = run(&inputs(), &config).unwrap();
                EventWriter::new(path.clone(), config.output.clone())
                    .write(&output.events)
                    .unwrap();
                std::fs::read(&path).unwrap()
            })
            .collect();

        assert!(!written[0].is_empty());
        assert_eq!(written[0], written[1]);
    }

    #[test]
    fn test_invalid_config_rejected_before_processing() {
        let config = ErosivityConfig::default().with_resolution_hours(0);
        assert!(run(&inputs(), &config).is_err());
    }
}
