//! Integration tests for the processor module
//!
//! Runs complete erosivity jobs over small CSV fixtures written to a
//! temporary directory.


use crate::loader::{AuxiliaryPaths, InputPaths};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two stations on a 6-hourly index.
///
/// Station 101 (ATC3) has a 14 mm two-step event starting 2018-01-01 00:00
/// and an 8 mm single-step event starting 2018-01-02 00:00. Station 102
/// (MDN1, no parameters) has one 7 mm single-step event.
pub const PRECIPITATION_CSV: &str = "\
Date,Station_Id 101,Station_Id 102
2018-01-01 06:00:00,2.0,0.0
2018-01-01 12:00:00,12.0,7.0
2018-01-01 18:00:00,0.0,0.0
2018-01-02 00:00:00,0.0,0.0
2018-01-02 06:00:00,8.0,1.0
2018-01-02 12:00:00,0.0,0.0
";

pub const STATIONS_CSV: &str = "\
Station_Id,EnS_name,Country
101,ATC3,FR
102,MDN1,ES
";

fn parameter_csv(value: f64) -> String {
    let months: Vec<String> = (1..=12).map(|m| format!("Month_{}", m)).collect();
    let values: Vec<String> = (1..=12).map(|_| value.to_string()).collect();
    format!("EnS_name,{}\nATC3,{}\n", months.join(","), values.join(","))
}

/// Auxiliary table with daily rows for station 101 only
fn auxiliary_csv(day1: f64, day2: f64) -> String {
    format!(
        "Date,Station_Id 101\n01/01/2018,{}\n02/01/2018,{}\n",
        day1, day2
    )
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Write the fixture tables; day 1 is cold enough to count as snowfall
pub fn create_inputs(temp_dir: &TempDir, with_auxiliary: bool) -> InputPaths {
    let dir = temp_dir.path();

    let auxiliary = with_auxiliary.then(|| AuxiliaryPaths {
        precip_duration: write(dir, "pd.csv", &auxiliary_csv(4.0, 2.0)),
        rain_gauge: write(dir, "rg.csv", &auxiliary_csv(3.0, 1.0)),
        min_temp: write(dir, "tn.csv", &auxiliary_csv(-4.0, 1.5)),
        max_temp: write(dir, "tx.csv", &auxiliary_csv(0.5, 5.0)),
    });

    InputPaths {
        precipitation: write(dir, "precipitation.csv", PRECIPITATION_CSV),
        stations: write(dir, "stations.csv", STATIONS_CSV),
        alpha: write(dir, "alpha.csv", &parameter_csv(2.0)),
        beta: write(dir, "beta.csv", &parameter_csv(1.0)),
        auxiliary,
    }
}
