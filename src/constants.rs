//! Application constants for the EMO erosivity processor
//!
//! Event thresholds, column naming conventions for the EMO/REDES input
//! tables, and the column layout of the output event table.

// =============================================================================
// Event Detection Thresholds
// =============================================================================

/// Default accumulation interval of the EMO5 precipitation series (hours)
pub const DEFAULT_RESOLUTION_HOURS: u32 = 6;

/// Minimum depth (mm) for a timestep to take part in an event (0.05 inch)
pub const CANDIDATE_THRESHOLD_MM: f64 = 1.27;

/// Minimum depth (mm) for a single-timestep burst to count as erosive (0.25 inch)
pub const SINGLE_STEP_THRESHOLD_MM: f64 = 6.35;

/// Minimum total depth (mm) for an event of any duration to count as erosive (0.5 inch)
pub const EVENT_THRESHOLD_MM: f64 = 12.7;

// =============================================================================
// Auxiliary Matching and Snow Masking
// =============================================================================

/// Default tolerance when matching events to auxiliary records (hours)
pub const DEFAULT_MATCH_TOLERANCE_HOURS: i64 = 24;

/// Max temperature (°C) at or below which an event is treated as snowfall
pub const SNOW_TEMPERATURE_THRESHOLD_C: f64 = 1.0;

/// Reason recorded for stations missing from the auxiliary tables
pub const SKIP_REASON_NO_AUX: &str = "no auxiliary time series";

// =============================================================================
// Input Column Conventions
// =============================================================================

/// Shared time index column of the precipitation and auxiliary tables
pub const DATE_COLUMN: &str = "Date";

/// Prefix of per-station columns, e.g. `Station_Id 1234`
pub const STATION_COLUMN_PREFIX: &str = "Station_Id";

/// Station identifier column of the reference table
pub const STATION_ID_COLUMN: &str = "Station_Id";

/// Ecological stratification column of the reference and parameter tables
pub const ENS_COLUMN: &str = "EnS_name";

/// Substring identifying the monthly value columns of a parameter table
pub const MONTH_COLUMN_MARKER: &str = "Month";

/// Length of the EnS prefix that names the parent EnZ zone
pub const ENZ_PREFIX_LEN: usize = 3;

/// Build the per-station column name used by the EMO tables
pub fn station_column(station_id: i64) -> String {
    format!("{} {}", STATION_COLUMN_PREFIX, station_id)
}

// =============================================================================
// Output Columns
// =============================================================================

pub mod output_columns {
    pub const STATION_ID: &str = "Station_Id";
    pub const ENS_NAME: &str = "EnS_name";
    pub const ENZ: &str = "EnZ";
    pub const START: &str = "Start timestamp";
    pub const END: &str = "End timestamp";
    pub const DURATION: &str = "Event dur (h)";
    pub const DEPTH: &str = "Rainfall depth (mm)";
    pub const RE: &str = "RE EMO";
    pub const ALPHA: &str = "Alpha";
    pub const BETA: &str = "Beta";
    pub const PRECIP_DURATION: &str = "pd_EMO5";
    pub const RAIN_GAUGE: &str = "rg_EMO5";
    pub const MIN_TEMP: &str = "tn_EMO5";
    pub const MAX_TEMP: &str = "tx_EMO5";

    /// Column order of the event table
    pub const ALL: &[&str] = &[
        STATION_ID,
        ENS_NAME,
        ENZ,
        START,
        END,
        DURATION,
        DEPTH,
        RE,
        ALPHA,
        BETA,
        PRECIP_DURATION,
        RAIN_GAUGE,
        MIN_TEMP,
        MAX_TEMP,
    ];
}

/// Timestamp format used for the output table
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted timestamp layouts, tried in order. ISO layouts come first; the
/// remaining ones read the day before the month.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Accepted date-only layouts (midnight is assumed)
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_column_naming() {
        assert_eq!(station_column(1234), "Station_Id 1234");
    }

    #[test]
    fn test_threshold_ordering() {
        assert!(CANDIDATE_THRESHOLD_MM < SINGLE_STEP_THRESHOLD_MM);
        assert!(SINGLE_STEP_THRESHOLD_MM < EVENT_THRESHOLD_MM);
    }

    #[test]
    fn test_output_column_count() {
        assert_eq!(output_columns::ALL.len(), 14);
        assert_eq!(output_columns::ALL[0], "Station_Id");
        assert_eq!(output_columns::ALL[7], "RE EMO");
    }
}
