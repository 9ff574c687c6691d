//! Event erosivity from the monthly power law `RE = alpha * depth^beta`.

use super::params::MonthlyParameters;
use crate::models::{AuxiliaryValues, ErosivityEvent, Event, Station};

/// Power-law erosivity; only defined for positive depths
pub fn erosivity(alpha: f64, beta: f64, depth_mm: f64) -> Option<f64> {
    if depth_mm > 0.0 {
        Some(alpha * depth_mm.powf(beta))
    } else {
        None
    }
}

/// Turn a station's erosive events into output rows.
///
/// Parameters are resolved from the calendar month of each event start.
pub fn estimate_events(
    station: &Station,
    events: &[Event],
    parameters: &MonthlyParameters,
) -> Vec<ErosivityEvent> {
    let enz = station.enz();

    events
        .iter()
        .map(|event| {
            let law = parameters.at(event.start);
            let re = match (law.alpha, law.beta) {
                (Some(alpha), Some(beta)) => erosivity(alpha, beta, event.depth_mm),
                _ => None,
            };

            ErosivityEvent {
                station_id: station.station_id,
                ens_name: station.ens_name.clone(),
                enz: enz.clone(),
                start: event.start,
                end: event.end,
                duration_hours: Some(event.duration_hours()),
                depth_mm: Some(event.depth_mm),
                re,
                alpha: law.alpha,
                beta: law.beta,
                aux: AuxiliaryValues::default(),
            }
        })
        .collect()
}
