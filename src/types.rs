//! Time primitives shared by the scale engine.
//!
//! Scale boundaries are wall-clock calendar instants: month shifting works on
//! year/month/day fields, so no time zone is attached.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::defaults;

/// An instant on the time axis
pub type Timestamp = NaiveDateTime;

/// Origin of the time axis, used when a scale start cannot be parsed
pub fn time_origin() -> Timestamp {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

/// Parse template time text.
///
/// Accepts RFC 3339 (the offset is dropped, the wall-clock fields are kept),
/// the layouts in [`defaults::TIME_FORMATS`] and the date-only layouts in
/// [`defaults::DATE_FORMATS`].
pub fn parse_time(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = defaults::TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }
    defaults::DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

/// Anything a caller may hand to a time scale edit
pub trait ToTimestamp {
    fn to_timestamp(&self) -> Option<Timestamp>;
}

impl ToTimestamp for str {
    fn to_timestamp(&self) -> Option<Timestamp> {
        parse_time(self)
    }
}

impl ToTimestamp for &str {
    fn to_timestamp(&self) -> Option<Timestamp> {
        parse_time(self)
    }
}

impl ToTimestamp for String {
    fn to_timestamp(&self) -> Option<Timestamp> {
        parse_time(self)
    }
}

impl ToTimestamp for NaiveDateTime {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Some(*self)
    }
}

impl ToTimestamp for NaiveDate {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Some(self.and_time(chrono::NaiveTime::MIN))
    }
}

/// Duration as fractional milliseconds, for proportional math
pub fn millis(delta: TimeDelta) -> f64 {
    // Whole milliseconds stay exact; the sub-millisecond rest is added on top.
    let whole = delta.num_milliseconds();
    let rest = delta - TimeDelta::milliseconds(whole);
    whole as f64 + rest.num_nanoseconds().unwrap_or(0) as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_date_only_layouts() {
        assert_eq!(parse_time("2021-01-10"), Some(at(2021, 1, 10, 0, 0, 0)));
        assert_eq!(parse_time("2021/01/10"), Some(at(2021, 1, 10, 0, 0, 0)));
        assert_eq!(parse_time("  2021/1/5 "), Some(at(2021, 1, 5, 0, 0, 0)));
    }

    #[test]
    fn parses_date_time_layouts() {
        assert_eq!(
            parse_time("2021-01-10T08:30:15"),
            Some(at(2021, 1, 10, 8, 30, 15))
        );
        assert_eq!(parse_time("2021/01/10 08:30"), Some(at(2021, 1, 10, 8, 30, 0)));
        assert_eq!(
            parse_time("2021-01-10T08:30:15+02:00"),
            Some(at(2021, 1, 10, 8, 30, 15))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("soon"), None);
        assert_eq!(parse_time("2021-13-01"), None);
    }

    #[test]
    fn origin_is_unix_epoch() {
        assert_eq!(time_origin(), at(1970, 1, 1, 0, 0, 0));
    }

    #[test]
    fn millis_of_whole_days() {
        assert_eq!(millis(TimeDelta::days(1)), 86_400_000.0);
        assert_eq!(millis(TimeDelta::zero()), 0.0);
        assert_eq!(millis(TimeDelta::milliseconds(-5)), -5.0);
    }
}
