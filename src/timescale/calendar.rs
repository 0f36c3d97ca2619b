//! Month arithmetic with explicit normalization
//!
//! Shifting never relies on a date type rolling `month = 13` or `Feb 31`
//! over: year/month carry and day clamping are done here by hand.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::errors::ScaleError;
use crate::types::Timestamp;

/// Leap year rule of the proleptic Gregorian calendar; `false` outside the
/// range chrono can represent
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_yo_opt(year, 1).is_some_and(|date| date.leap_year())
}

/// Days in `month` (1-based) of `year`
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}

/// A whole-scale shift by calendar months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthShift {
    months: i32,
    /// The reference start sat on the last day of its month
    end_of_month: bool,
    time: NaiveTime,
}

impl MonthShift {
    /// The shift moving `from` onto the month of `to`.
    ///
    /// Time of day is taken from `to` without its sub-second part.
    pub fn between(from: Timestamp, to: Timestamp) -> Self {
        let months = (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32);
        MonthShift {
            months,
            end_of_month: is_last_day_of_month(from.date()),
            time: to.time().with_nanosecond(0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn months(&self) -> i32 {
        self.months
    }

    pub fn is_end_of_month(&self) -> bool {
        self.end_of_month
    }

    /// Map one boundary.
    ///
    /// End-of-month shifts land on the last day of the destination month;
    /// otherwise the day is kept, clamped to the destination month's length.
    pub fn apply(&self, time: Timestamp) -> Result<Timestamp, ScaleError> {
        let out_of_range = ScaleError::OutOfRange {
            months: self.months,
        };
        let total = time
            .year()
            .checked_mul(12)
            .and_then(|m| m.checked_add(time.month0() as i32))
            .and_then(|m| m.checked_add(self.months))
            .ok_or_else(|| out_of_range.clone())?;
        let year = total.div_euclid(12);
        let month = total.rem_euclid(12) as u32 + 1;
        let last = days_in_month(year, month);
        let day = if self.end_of_month {
            last
        } else {
            time.day().min(last)
        };
        NaiveDate::from_ymd_opt(year, month, day)
            .map(|date| date.and_time(self.time))
            .ok_or(out_of_range)
    }
}

/// Months of each calendar year touched by `[start, end]`
fn months_per_year(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    if start > end {
        return Vec::new();
    }
    (start.year()..=end.year())
        .map(|year| {
            let first = if year == start.year() { start.month0() } else { 0 };
            let last = if year == end.year() { end.month0() } else { 11 };
            (year, last - first + 1)
        })
        .collect()
}

/// The year most covered by the given date ranges.
///
/// Each year scores the most months any single range covers in it; the
/// highest score wins and ties go to the earlier year.
pub fn infer_prime_year<I>(ranges: I) -> Option<i32>
where
    I: IntoIterator<Item = (NaiveDate, NaiveDate)>,
{
    let mut record: BTreeMap<i32, u32> = BTreeMap::new();
    for (start, end) in ranges {
        for (year, count) in months_per_year(start, end) {
            let best = record.entry(year).or_default();
            *best = (*best).max(count);
        }
    }
    record
        .into_iter()
        .fold(None, |best: Option<(i32, u32)>, (year, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((year, count)),
        })
        .map(|(year, _)| year)
}
