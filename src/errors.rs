//! Error types with rich diagnostics using miette
//!
//! Compile errors carry the offending clause as source code so a template
//! author sees exactly which snippet was rejected.

use chrono::NaiveDateTime;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// Compile Errors
// ============================================================================

/// Errors that occur while compiling a clause's right-hand side
#[derive(Error, Diagnostic, Debug)]
pub enum CompileError {
    #[error("invalid expression syntax")]
    #[diagnostic(code(roadmap::compile::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },

    #[error("invalid number literal: {literal}")]
    #[diagnostic(code(roadmap::compile::invalid_number))]
    InvalidNumber {
        literal: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("invalid number")]
        span: SourceSpan,
    },

    #[error("unknown identifier: {name}")]
    #[diagnostic(code(roadmap::compile::unknown_identifier))]
    UnknownIdentifier {
        name: String,
        #[help]
        help: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("not bound")]
        span: SourceSpan,
    },

    #[error("unsupported call")]
    #[diagnostic(
        code(roadmap::compile::unsupported_call),
        help("only `$.break`, `$.exit` and `$.drop` can be called")
    )]
    UnsupportedCall {
        #[source_code]
        src: NamedSource<String>,
        #[label("not callable")]
        span: SourceSpan,
    },

    #[error("`$` can only be used to call break, exit or drop")]
    #[diagnostic(code(roadmap::compile::invalid_control_use))]
    InvalidControlUse {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("`$.{function}` takes at most 2 arguments, got {count}")]
    #[diagnostic(code(roadmap::compile::too_many_arguments))]
    TooManyArguments {
        function: &'static str,
        count: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this call")]
        span: SourceSpan,
    },
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Non-control conditions raised while running a compiled expression
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("cannot read property `{property}` of {target}")]
    #[diagnostic(code(roadmap::eval::cannot_read_property))]
    CannotReadProperty {
        property: String,
        target: &'static str,
    },
}

/// A runtime fault isolated to one clause
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("dynamic expression failed: {expression}")]
#[diagnostic(code(roadmap::eval::fault))]
pub struct EvalFault {
    /// The clause text that failed
    pub expression: String,
    #[source]
    #[diagnostic_source]
    pub error: EvalError,
}

// ============================================================================
// Time Scale Errors
// ============================================================================

/// Errors from building or editing a time scale
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("value #{index} is not a valid time: {text:?}")]
    #[diagnostic(
        code(roadmap::scale::invalid_time),
        help("use RFC 3339 or a date such as 2021-01-10 / 2021/01/10")
    )]
    InvalidTime { index: usize, text: String },

    #[error("scale item {index} ends at {end} before it starts at {start}")]
    #[diagnostic(code(roadmap::scale::boundary_violation))]
    BoundaryViolation {
        index: usize,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("the last scale item has no end time")]
    #[diagnostic(code(roadmap::scale::missing_end))]
    MissingEnd,

    #[error("the template defines no scale items")]
    #[diagnostic(code(roadmap::scale::no_scale_items))]
    NoScaleItems,

    #[error("prime date map `{expression}` failed")]
    #[diagnostic(code(roadmap::scale::prime_date_map))]
    PrimeDateMap {
        expression: String,
        #[source]
        #[diagnostic_source]
        error: EvalError,
    },

    #[error("shifting by {months} months leaves the supported calendar range")]
    #[diagnostic(code(roadmap::scale::out_of_range))]
    OutOfRange { months: i32 },
}
