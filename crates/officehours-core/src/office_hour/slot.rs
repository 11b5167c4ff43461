use serde::{Deserialize, Serialize};

use crate::time::{TimeOfDay, TimeWindow};

/// One bookable sub-interval of an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub available: bool,
}

/// Splits `window` into consecutive slots of `minutes`, dropping a short trailing remainder.
pub(crate) fn partition(window: &TimeWindow, minutes: u32) -> Vec<(TimeOfDay, TimeOfDay)> {
    let mut slots = Vec::new();
    if minutes == 0 {
        return slots;
    }
    let mut start = window.start();
    while let Some(end) = start.checked_add_minutes(minutes) {
        if end > window.end() {
            break;
        }
        slots.push((start, end));
        start = end;
    }
    slots
}
