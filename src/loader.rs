//! CSV input loading.
//!
//! Reads the precipitation, station reference, parameter and auxiliary
//! tables with Polars and converts them into the typed inputs of the
//! pipeline. Any structural problem (missing file or column, unparseable
//! timestamp) is fatal here, before any station is processed.

use crate::config::ErosivityConfig;
use crate::constants::{
    DATE_COLUMN, DATE_FORMATS, ENS_COLUMN, MONTH_COLUMN_MARKER, STATION_COLUMN_PREFIX,
    STATION_ID_COLUMN, TIMESTAMP_FORMATS,
};
use crate::enrich::{AuxiliaryData, AuxiliarySeries};
use crate::erosivity::params::MONTHS;
use crate::erosivity::{MonthlyValues, ParameterSet, ParameterTable};
use crate::error::{ErosivityError, Result};
use crate::models::{AuxiliaryRecord, AuxiliaryValues, PrecipitationTable, Station, Timestamp};
use crate::pipeline::PipelineInputs;

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Digit run holding the station id in a `Station_Id <id>` column name
static STATION_DIGITS: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\d+"));

/// Paths of the four auxiliary EMO5 tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryPaths {
    pub precip_duration: PathBuf,
    pub rain_gauge: PathBuf,
    pub min_temp: PathBuf,
    pub max_temp: PathBuf,
}

impl AuxiliaryPaths {
    pub fn all(&self) -> [&Path; 4] {
        [
            &self.precip_duration,
            &self.rain_gauge,
            &self.min_temp,
            &self.max_temp,
        ]
    }
}

/// Paths of every input table of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub precipitation: PathBuf,
    pub stations: PathBuf,
    pub alpha: PathBuf,
    pub beta: PathBuf,
    pub auxiliary: Option<AuxiliaryPaths>,
}

impl InputPaths {
    /// All paths, for existence checks
    pub fn all(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = vec![
            &self.precipitation,
            &self.stations,
            &self.alpha,
            &self.beta,
        ];
        if let Some(auxiliary) = &self.auxiliary {
            paths.extend(auxiliary.all());
        }
        paths
    }
}

/// Load every input table of a run
pub fn load_inputs(paths: &InputPaths, config: &ErosivityConfig) -> Result<PipelineInputs> {
    let precipitation = load_precipitation(&paths.precipitation, config.depth_scale)?;
    let stations = load_stations(&paths.stations)?;
    let parameters = ParameterSet::new(
        load_parameter_table(&paths.alpha)?,
        load_parameter_table(&paths.beta)?,
    );
    let auxiliary = paths
        .auxiliary
        .as_ref()
        .map(load_auxiliary)
        .transpose()?;

    Ok(PipelineInputs {
        precipitation,
        stations,
        parameters,
        auxiliary,
    })
}

/// Read a CSV file with a header row.
///
/// The schema is inferred from every row, so a column that only turns
/// fractional late in a long series is still read as floats.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ErosivityError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()?
        .collect()?;

    debug!(
        "Read {}: {} rows, {} columns",
        path.display(),
        df.height(),
        df.width()
    );

    Ok(df)
}

/// Parse a timestamp in any accepted layout; date-only values mean midnight
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Station id embedded in a column name such as `Station_Id 1234`
pub fn station_id_from_column(name: &str) -> Result<i64> {
    let digits = STATION_DIGITS
        .as_ref()
        .map_err(|e| ErosivityError::configuration(e.to_string()))?;

    digits
        .find(name)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| ErosivityError::InvalidStationId {
            value: name.to_string(),
        })
}

/// Station id from a reference-table cell; integral floats like `147.0` are accepted
pub fn parse_station_value(value: &str) -> Result<i64> {
    let value = value.trim();
    if let Ok(id) = value.parse::<i64>() {
        return Ok(id);
    }

    match value.parse::<f64>() {
        // i64::MAX as f64 is 2^63, one past the largest id
        Ok(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        _ => Err(ErosivityError::InvalidStationId {
            value: value.to_string(),
        }),
    }
}

fn required_column<'a>(df: &'a DataFrame, path: &Path, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| ErosivityError::missing_column(path, name))
}

fn string_values(column: &Column) -> Result<Vec<Option<String>>> {
    let strings = column.cast(&DataType::String)?;
    let values = strings
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn float_values(column: &Column) -> Result<Vec<Option<f64>>> {
    let floats = column.cast(&DataType::Float64)?;
    let values = floats
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    Ok(values)
}

/// Collect the `Station_Id <id>` columns of a table as floats
fn station_columns(df: &DataFrame, path: &Path) -> Result<HashMap<i64, Vec<Option<f64>>>> {
    let mut columns = HashMap::new();

    for column in df.get_columns() {
        let name = column.name().as_str();
        if !name.starts_with(STATION_COLUMN_PREFIX) {
            continue;
        }

        let station_id = station_id_from_column(name)?;
        if columns.insert(station_id, float_values(column)?).is_some() {
            return Err(ErosivityError::malformed(
                path,
                format!("duplicate column for station {}", station_id),
            ));
        }
    }

    Ok(columns)
}

/// Load the precipitation table, scaling every depth by `depth_scale`
pub fn load_precipitation(path: &Path, depth_scale: f64) -> Result<PrecipitationTable> {
    let df = read_csv(path)?;
    let dates = string_values(required_column(&df, path, DATE_COLUMN)?)?;

    let timestamps = dates
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .as_deref()
                .and_then(parse_timestamp)
                .ok_or_else(|| ErosivityError::InvalidTimestamp {
                    path: path.to_path_buf(),
                    row,
                    value: value.clone().unwrap_or_default(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(row) = timestamps.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(ErosivityError::malformed(
            path,
            format!("timestamps are not in ascending order at row {}", row + 1),
        ));
    }

    let columns = station_columns(&df, path)?;
    if columns.is_empty() {
        return Err(ErosivityError::malformed(
            path,
            format!("no '{} <id>' columns", STATION_COLUMN_PREFIX),
        ));
    }

    let mut table = PrecipitationTable::new(timestamps);
    for (station_id, depths) in columns {
        let depths = if depth_scale == 1.0 {
            depths
        } else {
            depths
                .into_iter()
                .map(|depth| depth.map(|d| d * depth_scale))
                .collect()
        };
        table.insert(station_id, depths);
    }

    info!(
        "Loaded precipitation for {} stations over {} timesteps",
        table.station_count(),
        table.timestamps.len()
    );

    Ok(table)
}

/// Load the station reference table
pub fn load_stations(path: &Path) -> Result<Vec<Station>> {
    let df = read_csv(path)?;
    let ids = string_values(required_column(&df, path, STATION_ID_COLUMN)?)?;
    let zones = string_values(required_column(&df, path, ENS_COLUMN)?)?;

    let stations = ids
        .into_iter()
        .zip(zones)
        .map(|(id, ens)| {
            let station_id = parse_station_value(id.as_deref().unwrap_or_default())?;
            let ens_name = ens.unwrap_or_else(|| {
                warn!("Station {} has no EnS name", station_id);
                String::new()
            });
            Ok(Station::new(station_id, ens_name))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} reference stations", stations.len());
    Ok(stations)
}

/// Load one parameter table (alpha or beta) keyed by EnS name
pub fn load_parameter_table(path: &Path) -> Result<ParameterTable> {
    let df = read_csv(path)?;
    let zones = string_values(required_column(&df, path, ENS_COLUMN)?)?;

    let month_columns = df
        .get_columns()
        .iter()
        .filter(|column| column.name().as_str().contains(MONTH_COLUMN_MARKER))
        .map(float_values)
        .collect::<Result<Vec<_>>>()?;

    if month_columns.len() != MONTHS {
        return Err(ErosivityError::malformed(
            path,
            format!(
                "expected {} '{}' columns, found {}",
                MONTHS,
                MONTH_COLUMN_MARKER,
                month_columns.len()
            ),
        ));
    }

    let mut table = ParameterTable::new();
    for (row, zone) in zones.into_iter().enumerate() {
        let Some(zone) = zone else {
            debug!("Skipping parameter row {} without EnS name", row);
            continue;
        };
        let values = MonthlyValues::new(std::array::from_fn(|month| month_columns[month][row]));
        table.insert(zone, values);
    }

    info!("Loaded parameters for {} zones from {}", table.len(), path.display());
    Ok(table)
}

/// Load the four auxiliary tables.
///
/// The tables share the time axis of the precipitation-duration table row by
/// row. Rows without a date are dropped; a station is only included when all
/// four tables have a column for it.
pub fn load_auxiliary(paths: &AuxiliaryPaths) -> Result<AuxiliaryData> {
    let pd_df = read_csv(&paths.precip_duration)?;
    let dates = string_values(required_column(&pd_df, &paths.precip_duration, DATE_COLUMN)?)?;

    let timestamps = dates
        .iter()
        .enumerate()
        .map(|(row, value)| match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_timestamp(text).map(Some).ok_or_else(|| {
                ErosivityError::InvalidTimestamp {
                    path: paths.precip_duration.clone(),
                    row,
                    value: text.to_string(),
                }
            }),
        })
        .collect::<Result<Vec<Option<Timestamp>>>>()?;

    let precip_duration = station_columns(&pd_df, &paths.precip_duration)?;
    let mut others = Vec::with_capacity(3);
    for path in [&paths.rain_gauge, &paths.min_temp, &paths.max_temp] {
        let df = read_csv(path)?;
        if df.height() != pd_df.height() {
            return Err(ErosivityError::malformed(
                path,
                format!(
                    "{} rows, but {} has {}",
                    df.height(),
                    paths.precip_duration.display(),
                    pd_df.height()
                ),
            ));
        }
        others.push(station_columns(&df, path)?);
    }
    let [rain_gauge, min_temp, max_temp]: [HashMap<i64, Vec<Option<f64>>>; 3] = others
        .try_into()
        .map_err(|_| ErosivityError::malformed(&paths.precip_duration, "auxiliary tables incomplete"))?;

    let mut auxiliary = AuxiliaryData::new();
    for (station_id, pd_values) in &precip_duration {
        let (Some(rg_values), Some(tn_values), Some(tx_values)) = (
            rain_gauge.get(station_id),
            min_temp.get(station_id),
            max_temp.get(station_id),
        ) else {
            debug!("Station {} missing from some auxiliary tables", station_id);
            continue;
        };

        let records = timestamps
            .iter()
            .enumerate()
            .filter_map(|(row, timestamp)| {
                timestamp.map(|timestamp| AuxiliaryRecord {
                    timestamp,
                    values: AuxiliaryValues {
                        precip_duration: pd_values[row],
                        rain_gauge: rg_values[row],
                        min_temp: tn_values[row],
                        max_temp: tx_values[row],
                    },
                })
            })
            .collect();

        auxiliary.insert(*station_id, AuxiliarySeries::new(records));
    }

    info!(
        "Loaded auxiliary series for {} stations ({} dated rows)",
        auxiliary.len(),
        timestamps.iter().filter(|t| t.is_some()).count()
    );

    Ok(auxiliary)
}
