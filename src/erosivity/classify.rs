//! Selection of erosive events.
//!
//! An event is erosive when its total depth reaches the event threshold, or
//! when it is a single-window burst reaching the lower single-step threshold.

use crate::config::EventThresholds;
use crate::models::Event;
use chrono::TimeDelta;
use tracing::debug;

/// Decide whether one event is erosive
pub fn is_erosive(event: &Event, resolution: TimeDelta, thresholds: &EventThresholds) -> bool {
    let depth = event.depth_mm;

    if depth >= thresholds.event_mm {
        return true;
    }

    depth >= thresholds.single_step_mm && event.duration() == resolution
}

/// Keep the erosive events, preserving order
pub fn select_erosive(
    events: Vec<Event>,
    resolution: TimeDelta,
    thresholds: &EventThresholds,
) -> Vec<Event> {
    let total = events.len();
    let erosive: Vec<Event> = events
        .into_iter()
        .filter(|event| is_erosive(event, resolution, thresholds))
        .collect();

    debug!(
        "Event classification: {} -> {} erosive ({} below thresholds)",
        total,
        erosive.len(),
        total - erosive.len()
    );

    erosive
}
