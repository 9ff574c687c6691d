//! Snowfall masking.
//!
//! Events whose matched max temperature is at or below the threshold are
//! likely snowfall, so the configured measures are blanked. Rows are never
//! removed, and rows without a max temperature are left alone.

use crate::constants::output_columns;
use crate::error::{ErosivityError, Result};
use crate::models::ErosivityEvent;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// Output columns that can be masked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaskColumn {
    Re,
    Depth,
    Duration,
    Alpha,
    Beta,
}

impl MaskColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            MaskColumn::Re => output_columns::RE,
            MaskColumn::Depth => output_columns::DEPTH,
            MaskColumn::Duration => output_columns::DURATION,
            MaskColumn::Alpha => output_columns::ALPHA,
            MaskColumn::Beta => output_columns::BETA,
        }
    }

    fn clear(&self, event: &mut ErosivityEvent) {
        match self {
            MaskColumn::Re => event.re = None,
            MaskColumn::Depth => event.depth_mm = None,
            MaskColumn::Duration => event.duration_hours = None,
            MaskColumn::Alpha => event.alpha = None,
            MaskColumn::Beta => event.beta = None,
        }
    }

    /// Parse a comma-separated list of column names
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| name.parse::<MaskColumn>())
            .collect()
    }
}

impl FromStr for MaskColumn {
    type Err = ErosivityError;

    /// Accepts the output column names and short aliases
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "RE EMO" | "re" | "RE" => Ok(MaskColumn::Re),
            "Rainfall depth (mm)" | "depth" => Ok(MaskColumn::Depth),
            "Event dur (h)" | "duration" => Ok(MaskColumn::Duration),
            "Alpha" | "alpha" => Ok(MaskColumn::Alpha),
            "Beta" | "beta" => Ok(MaskColumn::Beta),
            other => Err(ErosivityError::configuration(format!(
                "Column '{}' cannot be snow-masked",
                other
            ))),
        }
    }
}

/// True when the matched max temperature indicates snowfall
pub fn is_snowfall(event: &ErosivityEvent, threshold_c: f64) -> bool {
    matches!(event.aux.max_temp, Some(tx) if tx <= threshold_c)
}

/// Blank the listed columns on snowfall rows; returns the rows masked
pub fn mask_snow(events: &mut [ErosivityEvent], columns: &[MaskColumn], threshold_c: f64) -> usize {
    let mut masked = 0usize;

    if columns.is_empty() {
        debug!("Snow mask: no columns configured");
        return 0;
    }

    for event in events.iter_mut() {
        if !is_snowfall(event, threshold_c) {
            continue;
        }
        for column in columns {
            column.clear(event);
        }
        masked += 1;
    }

    info!(
        "Snow mask: {} of {} events at or below {}°C (columns: {})",
        masked,
        events.len(),
        threshold_c,
        columns
            .iter()
            .map(MaskColumn::column_name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    masked
}
