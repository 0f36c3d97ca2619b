//! Calendar time scales
//!
//! [`TimeScales::build`] turns the template's scale descriptors into a
//! display tree of [`ScaleGroup`]s and a flat, contiguous sequence of
//! [`ScaleItem`] leaves sized proportionally to their unit weights. The
//! sequence answers point queries ([`TimeScales::find_item`]) and range
//! queries ([`TimeScales::layout_range`]) and can be re-anchored by whole
//! calendar months ([`TimeScales::modify_time`]), optionally through the
//! template's [`PrimeDateMap`] ([`TimeScales::set_prime_date`]).
//!
//! Edits are all-or-nothing: a [`ScaleError`] leaves the previous
//! boundaries in place.

mod builder;
pub mod calendar;
mod display;
mod layout;
mod prime;

pub use builder::{ScaleDescriptor, ScaleGroup};
pub use display::DisplayEntry;
pub use layout::ScaleItem;
pub use prime::PrimeDateMap;

use std::cell::Cell;
use std::fmt::Display;

use serde_json::{Value as Json, json};

use crate::errors::ScaleError;
use crate::log::{debug, trace};
use crate::types::{Timestamp, ToTimestamp};

use calendar::MonthShift;
use layout::{apply_layout, commit_boundaries, find_index, resolve_boundaries};

/// Pixel extent of one drawn item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRange {
    pub start: f64,
    pub end: f64,
    pub size: f64,
}

impl LayoutRange {
    /// Store as `itemStart`, `itemEnd`, `itemSize` in the render context.
    pub fn write_into(&self, layout: &mut Json) {
        if !layout.is_object() {
            *layout = json!({});
        }
        layout["itemStart"] = json!(self.start);
        layout["itemEnd"] = json!(self.end);
        layout["itemSize"] = json!(self.size);
    }
}

/// The scale tree and leaf sequence of one template
///
/// Point queries cache the last hit in a [`Cell`], so an instance must not be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct TimeScales {
    groups: Vec<ScaleGroup>,
    items: Vec<ScaleItem>,
    unit_count: f64,
    scale_size: f64,
    last_location: Cell<usize>,
}

impl TimeScales {
    /// Build from template descriptors and the pixel extent of the axis.
    pub fn build(descriptors: &[ScaleDescriptor], scale_size: f64) -> Result<Self, ScaleError> {
        let tree = builder::build_tree(descriptors)?;
        let mut scales = TimeScales {
            groups: tree.groups,
            items: tree.items,
            unit_count: tree.unit_count,
            scale_size,
            last_location: Cell::new(0),
        };
        let starts = scales.items.iter().map(ScaleItem::default_start).collect();
        let end = scales.last_scale().default_end();
        scales.commit(starts, end)?;
        apply_layout(&mut scales.items, scale_size, scales.unit_count);
        debug!(
            leaves = scales.items.len(),
            unit_count = scales.unit_count,
            "built time scales"
        );
        Ok(scales)
    }

    pub fn start_time(&self) -> Timestamp {
        self.first_scale().start_time()
    }

    pub fn end_time(&self) -> Timestamp {
        self.last_scale().end_time()
    }

    pub fn first_scale(&self) -> &ScaleItem {
        &self.items[0]
    }

    pub fn last_scale(&self) -> &ScaleItem {
        &self.items[self.items.len() - 1]
    }

    /// Leaves in template order
    pub fn items(&self) -> &[ScaleItem] {
        &self.items
    }

    /// Top level of the display tree
    pub fn groups(&self) -> &[ScaleGroup] {
        &self.groups
    }

    /// Sum of the leaf unit weights
    pub fn unit_count(&self) -> f64 {
        self.unit_count
    }

    pub fn scale_size(&self) -> f64 {
        self.scale_size
    }

    /// Re-run proportional sizing for a new pixel extent.
    pub fn set_scale_size(&mut self, scale_size: f64) {
        self.scale_size = scale_size;
        apply_layout(&mut self.items, scale_size, self.unit_count);
    }

    /// Index of the leaf containing `time`.
    pub fn find_index(&self, time: Timestamp) -> Option<usize> {
        find_index(&self.items, &self.last_location, time)
    }

    /// The leaf containing `time`; `None` before the start or at/after the end.
    pub fn find_item(&self, time: Timestamp) -> Option<&ScaleItem> {
        self.find_index(time).map(|i| &self.items[i])
    }

    /// Pixel position of `time`, if it lies on the scale
    pub fn layout_location(&self, time: Timestamp) -> Option<f64> {
        self.find_item(time).map(|item| item.layout_location(time))
    }

    /// Pixel extent of an item drawn from `start` to `end`.
    ///
    /// `None` when `start` is off the scale or the range is empty. An end
    /// past the scale is pinned to the last leaf's end.
    pub fn layout_range(&self, start: Timestamp, end: Timestamp) -> Option<LayoutRange> {
        if end <= start {
            return None;
        }
        let Some(first) = self.find_item(start) else {
            trace!(%start, "range starts off the scale");
            return None;
        };
        let item_start = first.layout_location(start);
        // start is on the scale and end > start, so a miss lies past the end
        let item_end = match self.find_item(end) {
            Some(item) => item.layout_location(end),
            None => self.last_scale().layout_end(),
        };
        Some(LayoutRange {
            start: item_start,
            end: item_end,
            size: item_end - item_start,
        })
    }

    /// Override boundaries with absolute times.
    ///
    /// `values[i]` becomes the start of leaf `i`; values past the last leaf
    /// set the scale end, the last one winning.
    pub fn set_time_scales<T>(&mut self, values: &[T]) -> Result<(), ScaleError>
    where
        T: ToTimestamp + Display,
    {
        let parsed = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value.to_timestamp().ok_or_else(|| ScaleError::InvalidTime {
                    index,
                    text: value.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut starts: Vec<_> = self.items.iter().map(ScaleItem::start_time).collect();
        let mut end = self.end_time();
        for (index, time) in parsed.into_iter().enumerate() {
            match starts.get_mut(index) {
                Some(start) => *start = time,
                None => end = time,
            }
        }
        self.commit(starts, Some(end))
    }

    /// Re-anchor the whole scale on the month of `new_start`.
    ///
    /// Every boundary moves by the same number of calendar months. When the
    /// current start is the last day of its month, every boundary lands on
    /// the last day of its new month. Time of day comes from `new_start`.
    pub fn modify_time<T>(&mut self, new_start: T) -> Result<(), ScaleError>
    where
        T: ToTimestamp + Display,
    {
        let target = new_start
            .to_timestamp()
            .ok_or_else(|| ScaleError::InvalidTime {
                index: 0,
                text: new_start.to_string(),
            })?;
        let shift = MonthShift::between(self.start_time(), target);
        let starts = self
            .items
            .iter()
            .map(|item| shift.apply(item.start_time()))
            .collect::<Result<Vec<_>, _>>()?;
        let end = shift.apply(self.end_time())?;
        debug!(months = shift.months(), end_of_month = shift.is_end_of_month(), "shifting time scales");
        self.commit(starts, Some(end))
    }

    /// Re-anchor the scale on the prime date of `date`.
    ///
    /// With a map the scale moves to the mapped date; without one this is
    /// [`modify_time`](Self::modify_time).
    pub fn set_prime_date<T>(&mut self, date: T, map: Option<&PrimeDateMap>) -> Result<(), ScaleError>
    where
        T: ToTimestamp + Display,
    {
        let Some(map) = map else {
            return self.modify_time(date);
        };
        let date = date.to_timestamp().ok_or_else(|| ScaleError::InvalidTime {
            index: 0,
            text: date.to_string(),
        })?;
        let prime = map.map(date)?;
        debug!(%date, %prime, "mapped prime date");
        self.modify_time(prime)
    }

    /// Back to the boundaries authored in the template.
    pub fn restore_time_scales(&mut self) -> Result<(), ScaleError> {
        let starts = self.items.iter().map(ScaleItem::default_start).collect();
        let end = self.last_scale().default_end();
        self.commit(starts, end)
    }

    /// Overlay display text onto the group tree.
    pub fn set_display(&mut self, entries: &[Option<DisplayEntry>]) {
        display::set_display(&mut self.groups, entries);
    }

    /// Reset every group's text to the captured default.
    pub fn restore_display(&mut self) {
        display::restore_display(&mut self.groups);
    }

    /// Validate, then write, a full set of boundaries.
    fn commit(&mut self, starts: Vec<Timestamp>, end: Option<Timestamp>) -> Result<(), ScaleError> {
        let bounds = resolve_boundaries(&starts, end)?;
        commit_boundaries(&mut self.items, &bounds);
        self.last_location.set(0);
        debug!(start = %self.start_time(), end = %self.end_time(), "committed scale boundaries");
        Ok(())
    }
}
