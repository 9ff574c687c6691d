//! Event segmentation of a precipitation series.
//!
//! Timesteps above the candidate threshold are grouped into events: a
//! candidate joins the running event when it follows the previous candidate
//! by at most one resolution window, otherwise it opens a new event. Depths
//! of sub-threshold timesteps are never accumulated.

use crate::models::{Event, PrecipitationSeries, Timestamp};
use chrono::TimeDelta;
use tracing::debug;

/// Split a station series into events.
///
/// The series must be in ascending time order. Events are returned in time
/// order with zero-based indices; the first candidate always opens event 0.
/// Each event starts one resolution window before its first member, since
/// a depth is the accumulation over the window ending at its timestamp.
pub fn segment_events(
    series: &PrecipitationSeries,
    resolution: TimeDelta,
    candidate_mm: f64,
) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::new();
    let mut previous: Option<Timestamp> = None;

    for (timestamp, depth) in series.iter() {
        // NaN compares false, so it never qualifies
        let Some(depth) = depth.filter(|d| *d > candidate_mm) else {
            continue;
        };

        let opens_event = previous.is_none_or(|prev| timestamp - prev > resolution);

        if opens_event {
            events.push(Event {
                index: events.len(),
                start: timestamp - resolution,
                end: timestamp,
                depth_mm: depth,
                members: 1,
            });
        } else if let Some(current) = events.last_mut() {
            current.end = timestamp;
            current.depth_mm += depth;
            current.members += 1;
        }

        previous = Some(timestamp);
    }

    debug!(
        "Station {}: {} events from {} timesteps",
        series.station_id,
        events.len(),
        series.len()
    );

    events
}
