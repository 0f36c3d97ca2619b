//! Default settings shared by the compiler and the time scale engine

/// Unit weight of a scale item whose descriptor gives none (or an unusable one)
pub const LAYOUT_UNIT: f64 = 1.0;

/// Source name shown in compile diagnostics
pub const DIAGNOSTIC_SOURCE: &str = "<dynamic expression>";

/// Accepted date-time layouts besides RFC 3339, tried in order
pub const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

/// Accepted date-only layouts, interpreted as midnight
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
