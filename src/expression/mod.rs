//! Dynamic attribute expressions
//!
//! A dynamic attribute holds `;`-separated clauses such as
//! `width=layout.itemSize; @fill=item.done ? 'green' : 'gray'; :=item.name`.
//! [`ClauseList::compile`] turns the text into clauses once per template load
//! and [`ClauseList::evaluate`] applies them to a [`Node`] per render pass.

mod control;
mod eval;
mod evaluator;
mod setter;
mod table;
mod value;

pub use control::{ControlOutcome, Outcome};
pub(crate) use eval::Scope;
pub use eval::{Inputs, Program};
pub use evaluator::{Boundary, Evaluation};
pub use setter::{
    Apply, AttributeSetter, BreakSetter, ExitSetter, Node, Setter, ShowSetter, StyleSetter,
    TextSetter,
};
pub use table::{ExpressionId, ExpressionTable};
pub use value::{Function, Value};

use crate::errors::CompileError;
use crate::log::warn;
use crate::parse::parse_expression;

/// How a clause's value reaches the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetterKind {
    /// `key=...`
    Attribute,
    /// `@key=...`
    StyleProperty,
    /// `:=...`
    TextContent,
    /// `$name=...`
    Control,
    /// value-only clause
    None,
}

/// Control setters registered under `$`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlName {
    Show,
    Break,
    Exit,
}

impl ControlName {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$show" => Some(ControlName::Show),
            "$break" => Some(ControlName::Break),
            "$exit" => Some(ControlName::Exit),
            _ => None,
        }
    }
}

/// One compiled `key=expression` unit
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    target_key: String,
    kind: SetterKind,
    control: Option<ControlName>,
    setter: Option<Setter>,
    program: Program,
    source: String,
}

impl Clause {
    /// Compile one trimmed, non-empty clause.
    fn compile(source: &str) -> (Clause, Option<CompileError>) {
        let (key, expression) = split_assignment(source);
        let key = key.trim();
        let (kind, control, target_key) = classify(key);
        let mut clause = Clause {
            setter: None,
            target_key,
            kind,
            control,
            program: Program::inert(),
            source: source.to_string(),
        };
        match parse_expression(expression.trim()) {
            Ok(expr) => {
                clause.setter = setter_for(kind, control, &clause.target_key);
                clause.program = Program::compiled(expr);
                (clause, None)
            }
            Err(error) => {
                warn!(clause = source, error = %error, "dynamic expression failed to compile");
                (clause, Some(error))
            }
        }
    }

    /// Attribute name, style property (without `@`), or the raw key
    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    pub fn setter_kind(&self) -> SetterKind {
        self.kind
    }

    pub fn control_name(&self) -> Option<ControlName> {
        self.control
    }

    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    pub fn source_text(&self) -> &str {
        &self.source
    }

    /// Failed to compile: computes nothing, sets nothing
    pub fn is_inert(&self) -> bool {
        self.program.is_inert()
    }
}

/// The ordered clauses of one dynamic attribute
#[derive(Debug, Default)]
pub struct ClauseList {
    clauses: Vec<Clause>,
    diagnostics: Vec<CompileError>,
}

impl ClauseList {
    /// Compile `text`; never fails, broken clauses become inert.
    pub fn compile(text: &str) -> Self {
        let mut list = ClauseList::default();
        for raw in text.split(';') {
            let source = raw.trim();
            if source.is_empty() {
                continue;
            }
            let (clause, error) = Clause::compile(source);
            list.clauses.push(clause);
            list.diagnostics.extend(error);
        }
        list
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Compile failures, in clause order
    pub fn diagnostics(&self) -> &[CompileError] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Split at the assignment `=`, skipping comparison and arrow operators and
/// string literals. No assignment gives an empty key.
fn split_assignment(clause: &str) -> (&str, &str) {
    let bytes = clause.as_bytes();
    let mut quote = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'=' => {
                    let joined_before = i > 0 && matches!(bytes[i - 1], b'=' | b'!' | b'<' | b'>');
                    let joined_after = matches!(bytes.get(i + 1), Some(b'=' | b'>'));
                    if !joined_before && !joined_after {
                        return (&clause[..i], &clause[i + 1..]);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    ("", clause)
}

fn classify(key: &str) -> (SetterKind, Option<ControlName>, String) {
    match key.chars().next() {
        None => (SetterKind::None, None, String::new()),
        Some('@') => (SetterKind::StyleProperty, None, key[1..].to_string()),
        Some('$') => (SetterKind::Control, ControlName::from_key(key), key.to_string()),
        Some(':') => (SetterKind::TextContent, None, key.to_string()),
        Some(_) => (SetterKind::Attribute, None, key.to_string()),
    }
}

fn setter_for(kind: SetterKind, control: Option<ControlName>, target_key: &str) -> Option<Setter> {
    match kind {
        SetterKind::Attribute => Some(
            AttributeSetter {
                key: target_key.to_string(),
            }
            .into(),
        ),
        SetterKind::StyleProperty => Some(
            StyleSetter {
                property: target_key.to_string(),
            }
            .into(),
        ),
        SetterKind::TextContent => Some(TextSetter.into()),
        SetterKind::Control => control.map(|name| match name {
            ControlName::Show => ShowSetter.into(),
            ControlName::Break => BreakSetter.into(),
            ControlName::Exit => ExitSetter.into(),
        }),
        SetterKind::None => None,
    }
}
