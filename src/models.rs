//! Core data structures and types for erosivity processing.
//!
//! Defines the precipitation series handed to the event segmenter, the
//! events it produces, the rows of the output event table, and the
//! processing statistics reported at the end of a run.

use crate::constants::ENZ_PREFIX_LEN;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Timestamps are naive: EMO5 and the REDES tables carry no zone information
pub type Timestamp = NaiveDateTime;

/// Precipitation depths of one station on the shared time index.
///
/// `depths[i]` is the accumulation over the window ending at `timestamps[i]`.
#[derive(Debug, Clone)]
pub struct PrecipitationSeries {
    pub station_id: i64,
    pub timestamps: Arc<[Timestamp]>,
    pub depths: Vec<Option<f64>>,
}

impl PrecipitationSeries {
    pub fn new(station_id: i64, timestamps: Arc<[Timestamp]>, depths: Vec<Option<f64>>) -> Self {
        Self {
            station_id,
            timestamps,
            depths,
        }
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Iterate over (timestamp, depth) pairs
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, Option<f64>)> + '_ {
        self.timestamps.iter().copied().zip(self.depths.iter().copied())
    }
}

/// Precipitation for all stations on one shared, ascending time index
#[derive(Debug, Clone, Default)]
pub struct PrecipitationTable {
    pub timestamps: Arc<[Timestamp]>,
    pub columns: HashMap<i64, Vec<Option<f64>>>,
}

impl PrecipitationTable {
    pub fn new(timestamps: Vec<Timestamp>) -> Self {
        Self {
            timestamps: timestamps.into(),
            columns: HashMap::new(),
        }
    }

    pub fn insert(&mut self, station_id: i64, depths: Vec<Option<f64>>) {
        self.columns.insert(station_id, depths);
    }

    /// The series of one station, if the table has a column for it
    pub fn series(&self, station_id: i64) -> Option<PrecipitationSeries> {
        self.columns.get(&station_id).map(|depths| {
            PrecipitationSeries::new(station_id, Arc::clone(&self.timestamps), depths.clone())
        })
    }

    pub fn station_count(&self) -> usize {
        self.columns.len()
    }
}

/// A station from the reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: i64,
    pub ens_name: String,
}

impl Station {
    pub fn new(station_id: i64, ens_name: impl Into<String>) -> Self {
        Self {
            station_id,
            ens_name: ens_name.into(),
        }
    }

    /// Parent environmental zone: the first three characters of the EnS name
    pub fn enz(&self) -> String {
        self.ens_name.chars().take(ENZ_PREFIX_LEN).collect()
    }
}

/// A maximal run of candidate timesteps
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Zero-based, increasing in time within a station
    pub index: usize,
    pub start: Timestamp,
    pub end: Timestamp,
    pub depth_mm: f64,
    pub members: usize,
}

impl Event {
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Duration in hours at minute precision
    pub fn duration_hours(&self) -> f64 {
        self.duration().num_minutes() as f64 / 60.0
    }
}

/// Auxiliary EMO5 variables attached to an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryValues {
    pub precip_duration: Option<f64>,
    pub rain_gauge: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
}

impl AuxiliaryValues {
    pub fn is_empty(&self) -> bool {
        self.precip_duration.is_none()
            && self.rain_gauge.is_none()
            && self.min_temp.is_none()
            && self.max_temp.is_none()
    }
}

/// One auxiliary observation on the shared time index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxiliaryRecord {
    pub timestamp: Timestamp,
    pub values: AuxiliaryValues,
}

/// One row of the output event table.
///
/// Numeric measures are optional: RE is missing when the zone has no
/// parameters, and any measure may be blanked by the snow mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErosivityEvent {
    pub station_id: i64,
    pub ens_name: String,
    pub enz: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration_hours: Option<f64>,
    pub depth_mm: Option<f64>,
    pub re: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub aux: AuxiliaryValues,
}

/// A station left out of a processing step, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStation {
    pub station_id: i64,
    pub reason: String,
}

/// Processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub stations_processed: usize,
    pub stations_without_events: usize,
    pub stations_missing_parameters: usize,
    pub stations_skipped: usize,
    pub candidate_events: usize,
    pub erosive_events: usize,
    pub events_matched: usize,
    pub events_masked: usize,
    pub rows_written: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2020, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_enz_is_three_character_prefix() {
        let station = Station::new(12, "ATC3");
        assert_eq!(station.enz(), "ATC");

        let short = Station::new(13, "LU");
        assert_eq!(short.enz(), "LU");
    }

    #[test]
    fn test_event_duration_hours() {
        let event = Event {
            index: 0,
            start: ts(1, 0),
            end: ts(1, 18),
            depth_mm: 20.0,
            members: 3,
        };
        assert_eq!(event.duration_hours(), 18.0);
        assert_eq!(event.duration(), TimeDelta::hours(18));
    }

    #[test]
    fn test_auxiliary_values_empty() {
        assert!(AuxiliaryValues::default().is_empty());
        let values = AuxiliaryValues {
            max_temp: Some(4.0),
            ..Default::default()
        };
        assert!(!values.is_empty());
    }

    #[test]
    fn test_series_iteration_pairs_timestamps() {
        let timestamps: Arc<[Timestamp]> = vec![ts(1, 6), ts(1, 12)].into();
        let series = PrecipitationSeries::new(7, timestamps, vec![Some(2.0), None]);

        let pairs: Vec<_> = series.iter().collect();
        assert_eq!(pairs, vec![(ts(1, 6), Some(2.0)), (ts(1, 12), None)]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_table_shares_time_index() {
        let mut table = PrecipitationTable::new(vec![ts(2, 0), ts(2, 6)]);
        table.insert(10, vec![Some(1.0), Some(3.0)]);

        let series = table.series(10).unwrap();
        assert!(Arc::ptr_eq(&series.timestamps, &table.timestamps));
        assert_eq!(series.depths, vec![Some(1.0), Some(3.0)]);
        assert!(table.series(11).is_none());
        assert_eq!(table.station_count(), 1);
    }
}
