//! Prime date maps
//!
//! A template may carry an expression over `year`, `month` and `day` that
//! turns the date a host asks for into the date the scale starts at, such as
//! the first day of the fiscal year containing it.

use chrono::{DateTime, Datelike};

use crate::ast::Bindings;
use crate::errors::{CompileError, ScaleError};
use crate::expression::{Program, Scope, Value};
use crate::parse::parse_with;
use crate::types::{Timestamp, parse_time};

/// A compiled prime date map
#[derive(Debug, Clone, PartialEq)]
pub struct PrimeDateMap {
    source: String,
    program: Program,
}

impl PrimeDateMap {
    /// Compile the map text once per template load.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let source = source.trim();
        let expr = parse_with(source, Bindings::PrimeDate)?;
        Ok(PrimeDateMap {
            source: source.to_string(),
            program: Program::compiled(expr),
        })
    }

    pub fn source_text(&self) -> &str {
        &self.source
    }

    /// Map `date` through the expression.
    ///
    /// `month` is 1-based. A string result is read as template time text, a
    /// number as milliseconds since the Unix epoch.
    pub fn map(&self, date: Timestamp) -> Result<Timestamp, ScaleError> {
        let scope = Scope::Date {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        };
        let outcome = self
            .program
            .run_in(scope)
            .map_err(|error| ScaleError::PrimeDateMap {
                expression: self.source.clone(),
                error,
            })?;
        let value = outcome.value().unwrap_or(Value::Undefined);
        to_time(&value).ok_or_else(|| ScaleError::InvalidTime {
            index: 0,
            text: value.to_string(),
        })
    }
}

fn to_time(value: &Value<'_>) -> Option<Timestamp> {
    match value {
        Value::Str(text) => parse_time(text),
        Value::Number(millis) if millis.is_finite() => {
            DateTime::from_timestamp_millis(*millis as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn fiscal_year_start() {
        let map = PrimeDateMap::compile(" (month < 4 ? year - 1 : year) + '-04-01' ").unwrap();
        assert_eq!(map.source_text(), "(month < 4 ? year - 1 : year) + '-04-01'");
        assert_eq!(map.map(at(2025, 2, 10)), Ok(at(2024, 4, 1)));
        assert_eq!(map.map(at(2025, 4, 30)), Ok(at(2025, 4, 1)));
    }

    #[test]
    fn numbers_are_epoch_millis() {
        let map = PrimeDateMap::compile("day * 86400000").unwrap();
        assert_eq!(map.map(at(2025, 2, 3)), Ok(at(1970, 1, 4)));
    }

    #[test]
    fn non_time_result_is_invalid() {
        let map = PrimeDateMap::compile("'soon'").unwrap();
        assert_eq!(
            map.map(at(2025, 2, 3)),
            Err(ScaleError::InvalidTime {
                index: 0,
                text: "soon".into()
            })
        );
    }

    #[test]
    fn runtime_fault_names_the_map() {
        let map = PrimeDateMap::compile("day.x.y").unwrap();
        assert!(matches!(
            map.map(at(2025, 2, 3)),
            Err(ScaleError::PrimeDateMap { expression, .. }) if expression == "day.x.y"
        ));
    }

    #[test]
    fn template_inputs_are_not_bound() {
        assert!(matches!(
            PrimeDateMap::compile("item.start"),
            Err(CompileError::UnknownIdentifier { .. })
        ));
    }
}
