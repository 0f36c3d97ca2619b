//! The flat leaf sequence: boundaries, proportional sizing and lookups

use std::cell::Cell;

use chrono::TimeDelta;

use crate::errors::ScaleError;
use crate::types::{Timestamp, millis};

/// A leaf of the scale: one contiguous slice of the time axis
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleItem {
    start_time: Timestamp,
    end_time: Timestamp,
    time_length: TimeDelta,
    layout_unit: f64,
    layout_start: f64,
    layout_size: f64,
    layout_end: f64,
    default_start: Timestamp,
    default_end: Option<Timestamp>,
}

impl ScaleItem {
    pub(crate) fn new(layout_unit: f64, start: Timestamp, end: Option<Timestamp>) -> Self {
        ScaleItem {
            start_time: start,
            end_time: end.unwrap_or(start),
            time_length: TimeDelta::zero(),
            layout_unit,
            layout_start: 0.0,
            layout_size: 0.0,
            layout_end: 0.0,
            default_start: start,
            default_end: end,
        }
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn time_length(&self) -> TimeDelta {
        self.time_length
    }

    pub fn layout_unit(&self) -> f64 {
        self.layout_unit
    }

    pub fn layout_start(&self) -> f64 {
        self.layout_start
    }

    pub fn layout_size(&self) -> f64 {
        self.layout_size
    }

    pub fn layout_end(&self) -> f64 {
        self.layout_end
    }

    /// Start as authored in the template
    pub fn default_start(&self) -> Timestamp {
        self.default_start
    }

    /// End as authored in the template, if it parsed
    pub fn default_end(&self) -> Option<Timestamp> {
        self.default_end
    }

    /// Does `time` fall inside `[start, end)`?
    pub fn contains(&self, time: Timestamp) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Pixel position of `time`, clamped to this item.
    ///
    /// A zero-length item maps everything to its `layout_start`.
    pub fn layout_location(&self, time: Timestamp) -> f64 {
        let length = millis(self.time_length);
        if length <= 0.0 {
            return self.layout_start;
        }
        let delta = millis(time - self.start_time).clamp(0.0, length);
        self.layout_start + self.layout_size * delta / length
    }

    fn set_bounds(&mut self, start: Timestamp, end: Timestamp) {
        self.start_time = start;
        self.end_time = end;
        self.time_length = end - start;
    }
}

/// Contiguous `(start, end)` pairs for the given starts and final end.
///
/// Walks tail to head: every item ends where its successor starts, the last
/// one at `end`.
pub(crate) fn resolve_boundaries(
    starts: &[Timestamp],
    end: Option<Timestamp>,
) -> Result<Vec<(Timestamp, Timestamp)>, ScaleError> {
    let mut end = end.ok_or(ScaleError::MissingEnd)?;
    let mut bounds = Vec::with_capacity(starts.len());
    for (index, &start) in starts.iter().enumerate().rev() {
        if end < start {
            return Err(ScaleError::BoundaryViolation { index, start, end });
        }
        bounds.push((start, end));
        end = start;
    }
    bounds.reverse();
    Ok(bounds)
}

/// Write resolved boundaries into the items.
pub(crate) fn commit_boundaries(items: &mut [ScaleItem], bounds: &[(Timestamp, Timestamp)]) {
    for (item, &(start, end)) in items.iter_mut().zip(bounds) {
        item.set_bounds(start, end);
    }
}

/// Give each item `scale_size / unit_count * layout_unit` pixels, in order.
pub(crate) fn apply_layout(items: &mut [ScaleItem], scale_size: f64, unit_count: f64) {
    let unit_size = if unit_count > 0.0 {
        scale_size / unit_count
    } else {
        0.0
    };
    let mut offset = 0.0;
    for item in items {
        item.layout_size = unit_size * item.layout_unit;
        item.layout_start = offset;
        offset += item.layout_size;
        item.layout_end = offset;
    }
}

/// Directional scan from the cached index.
///
/// The direction is fixed by the first miss; the scan stops at the first
/// item containing `time` or when it walks off the sequence.
pub(crate) fn find_index(items: &[ScaleItem], cache: &Cell<usize>, time: Timestamp) -> Option<usize> {
    let last = items.len().checked_sub(1)?;
    let mut index = cache.get().min(last);
    let mut step = 0isize;
    loop {
        let item = &items[index];
        if item.contains(time) {
            cache.set(index);
            return Some(index);
        }
        if step == 0 {
            step = if time < item.start_time { -1 } else { 1 };
        }
        index = index.checked_add_signed(step).filter(|&i| i <= last)?;
    }
}
