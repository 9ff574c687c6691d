//! Auxiliary variable matching for erosive events.
//!
//! Each event is paired with the auxiliary record closest to its start
//! timestamp within a tolerance window. Stations missing from the auxiliary
//! tables are reported as skipped and their events pass through with empty
//! auxiliary values.

use crate::config::MatchingConfig;
use crate::constants::SKIP_REASON_NO_AUX;
use crate::error::{ErosivityError, Result};
use crate::models::{AuxiliaryRecord, AuxiliaryValues, ErosivityEvent, SkippedStation, Timestamp};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Search direction relative to the event start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchDirection {
    /// Closest record either side; ties go to the earlier record
    Nearest,
    /// First record at or after the event start
    Forward,
    /// Last record at or before the event start
    Backward,
}

impl FromStr for MatchDirection {
    type Err = ErosivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(MatchDirection::Nearest),
            "forward" => Ok(MatchDirection::Forward),
            "backward" => Ok(MatchDirection::Backward),
            other => Err(ErosivityError::configuration(format!(
                "Unknown match direction '{}' (expected nearest, forward or backward)",
                other
            ))),
        }
    }
}

impl fmt::Display for MatchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchDirection::Nearest => "nearest",
            MatchDirection::Forward => "forward",
            MatchDirection::Backward => "backward",
        };
        f.write_str(name)
    }
}

/// Auxiliary records of one station, sorted by timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuxiliarySeries {
    records: Vec<AuxiliaryRecord>,
}

impl AuxiliarySeries {
    /// Sorts by timestamp; records sharing a timestamp keep their order
    pub fn new(mut records: Vec<AuxiliaryRecord>) -> Self {
        records.sort_by_key(|record| record.timestamp);
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AuxiliaryRecord] {
        &self.records
    }

    /// Find the record for `target` within `tolerance` (inclusive)
    pub fn find(
        &self,
        target: Timestamp,
        tolerance: TimeDelta,
        direction: MatchDirection,
    ) -> Option<&AuxiliaryRecord> {
        let backward = || {
            let idx = self.records.partition_point(|r| r.timestamp <= target);
            idx.checked_sub(1).map(|i| &self.records[i])
        };
        let forward = || {
            let idx = self.records.partition_point(|r| r.timestamp < target);
            self.records.get(idx)
        };

        let candidate = match direction {
            MatchDirection::Backward => backward(),
            MatchDirection::Forward => forward(),
            MatchDirection::Nearest => match (backward(), forward()) {
                (Some(before), Some(after)) => {
                    if after.timestamp - target < target - before.timestamp {
                        Some(after)
                    } else {
                        Some(before)
                    }
                }
                (before, after) => before.or(after),
            },
        }?;

        let distance = if candidate.timestamp >= target {
            candidate.timestamp - target
        } else {
            target - candidate.timestamp
        };
        (distance <= tolerance).then_some(candidate)
    }
}

/// Auxiliary series keyed by station id
pub type AuxiliaryData = HashMap<i64, AuxiliarySeries>;

/// Result of matching the event table against the auxiliary data
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub events: Vec<ErosivityEvent>,
    pub skipped: Vec<SkippedStation>,
    pub matched: usize,
}

/// Attach auxiliary values to every event.
///
/// Event order is preserved. Unmatched events keep empty auxiliary values.
pub fn match_auxiliary(
    events: Vec<ErosivityEvent>,
    auxiliary: &AuxiliaryData,
    config: &MatchingConfig,
) -> MatchOutcome {
    let tolerance = config.tolerance();
    let mut skipped = Vec::new();
    let mut reported: HashSet<i64> = HashSet::new();
    let mut matched = 0usize;

    let events: Vec<ErosivityEvent> = events
        .into_iter()
        .map(|mut event| {
            let Some(series) = auxiliary.get(&event.station_id) else {
                if reported.insert(event.station_id) {
                    warn!(
                        "Station {} has no auxiliary time series; events left unenriched",
                        event.station_id
                    );
                    skipped.push(SkippedStation {
                        station_id: event.station_id,
                        reason: SKIP_REASON_NO_AUX.to_string(),
                    });
                }
                event.aux = AuxiliaryValues::default();
                return event;
            };

            event.aux = match series.find(event.start, tolerance, config.direction) {
                Some(record) => {
                    matched += 1;
                    record.values
                }
                None => {
                    debug!(
                        "Station {}: no auxiliary record within {}h of {}",
                        event.station_id, config.tolerance_hours, event.start
                    );
                    AuxiliaryValues::default()
                }
            };
            event
        })
        .collect();

    info!(
        "Auxiliary matching complete: {}/{} events matched ({} stations skipped)",
        matched,
        events.len(),
        skipped.len()
    );

    MatchOutcome {
        events,
        skipped,
        matched,
    }
}
