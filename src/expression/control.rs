//! The `$.break` / `$.exit` / `$.drop` protocol
//!
//! Control calls never unwind through the evaluator with exceptions.
//! `$.break`/`$.exit` wrap their value in [`Value::Signal`] so it can still
//! travel through `??`, `?:` and friends before reaching the clause, and
//! `$.drop` short-circuits as [`Fault::Drop`].

use crate::ast::ControlFn;
use crate::errors::EvalError;

use super::value::{Function, Value};

/// How far a signalled stop reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlOutcome {
    /// Stop the current clause list
    Break,
    /// Stop the clause list and the whole render pass
    Exit,
}

/// Result of running one compiled program
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Value(T),
    /// Skip this clause's setter
    Drop,
    Break(T),
    Exit(T),
}

impl<T> Outcome<T> {
    pub fn control(&self) -> Option<ControlOutcome> {
        match self {
            Outcome::Break(_) => Some(ControlOutcome::Break),
            Outcome::Exit(_) => Some(ControlOutcome::Exit),
            Outcome::Value(_) | Outcome::Drop => None,
        }
    }

    /// The carried value, if the setter should run
    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Value(v) | Outcome::Break(v) | Outcome::Exit(v) => Some(v),
            Outcome::Drop => None,
        }
    }
}

impl<'a> Outcome<Value<'a>> {
    pub(crate) fn from_value(value: Value<'a>) -> Self {
        match value {
            Value::Signal(ControlOutcome::Break, inner) => Outcome::Break(*inner),
            Value::Signal(ControlOutcome::Exit, inner) => Outcome::Exit(*inner),
            value => Outcome::Value(value),
        }
    }
}

/// Short-circuit of the evaluator
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fault {
    Drop,
    Error(EvalError),
}

impl From<EvalError> for Fault {
    fn from(error: EvalError) -> Self {
        Fault::Error(error)
    }
}

/// Does a control call fire for `value`?
///
/// Without a check the call fires on a falsy value. With one it fires when
/// the check is strictly equal to the value, or when the check is a
/// function returning a truthy result for it.
pub(crate) fn fires<'a>(
    value: &Value<'a>,
    check: Option<&Value<'a>>,
    call: impl FnOnce(&Function<'a>, Value<'a>) -> Result<Value<'a>, Fault>,
) -> Result<bool, Fault> {
    match check {
        None => Ok(!value.is_truthy()),
        Some(check) if value.strict_equals(check) => Ok(true),
        Some(Value::Function(predicate)) => Ok(call(predicate, value.clone())?.is_truthy()),
        Some(_) => Ok(false),
    }
}

/// Result of a control call; a call that does not fire returns its value
pub(crate) fn settle(function: ControlFn, value: Value<'_>, fired: bool) -> Result<Value<'_>, Fault> {
    if !fired {
        return Ok(value);
    }
    match function {
        ControlFn::Break => Ok(Value::Signal(ControlOutcome::Break, Box::new(value))),
        ControlFn::Exit => Ok(Value::Signal(ControlOutcome::Exit, Box::new(value))),
        ControlFn::Drop => Err(Fault::Drop),
    }
}
