//! Dynamic attribute expressions and calendar time scales for roadmap
//! rendering.
//!
//! A host walks a drawing template once per render pass. Two engines do the
//! work it cannot do by plain cloning:
//!
//! - [`expression`]: compiles `key=expression; ...` attribute text into clause
//!   lists and applies them to template nodes with project/item/layout data,
//!   honouring the `$.drop` / `$.break` / `$.exit` control protocol.
//! - [`timescale`]: builds the calendar scale tree from template descriptors
//!   and maps timestamps to pixel positions, with month-aware shifting.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "expression.pest"]
pub struct ExpressionParser;

pub mod ast;
pub mod defaults;
pub mod errors;
pub mod expression;
pub mod log;
pub mod parse;
pub mod timescale;
pub mod types;

pub use errors::{CompileError, EvalError, EvalFault, ScaleError};
pub use expression::{
    Boundary, Clause, ClauseList, ControlName, ControlOutcome, Evaluation, ExpressionId,
    ExpressionTable, Node, Outcome, SetterKind, Value,
};
pub use timescale::{
    DisplayEntry, LayoutRange, PrimeDateMap, ScaleDescriptor, ScaleGroup, ScaleItem, TimeScales,
};
pub use types::{Timestamp, ToTimestamp, parse_time};
