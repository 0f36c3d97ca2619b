//! Clause setters
//!
//! The left-hand side of a clause is classified once at compile time into
//! one of these setters; evaluation only dispatches.

use enum_dispatch::enum_dispatch;

use super::control::ControlOutcome;
use super::value::Value;

/// A template node as seen by the evaluator
pub trait Node {
    fn set_attribute(&mut self, key: &str, value: &Value<'_>);
    fn set_style_property(&mut self, property: &str, value: &Value<'_>);
    fn set_text_content(&mut self, value: &Value<'_>);
    /// Detach the node from its parent
    fn remove(&mut self);
}

#[enum_dispatch]
pub trait Apply {
    /// Write `value` into `node`; setters may raise their own stop
    fn apply(&self, node: &mut dyn Node, value: &Value<'_>) -> Option<ControlOutcome>;
}

#[enum_dispatch(Apply)]
#[derive(Debug, Clone, PartialEq)]
pub enum Setter {
    AttributeSetter,
    StyleSetter,
    TextSetter,
    ShowSetter,
    BreakSetter,
    ExitSetter,
}

/// `key=...`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSetter {
    pub key: String,
}

impl Apply for AttributeSetter {
    fn apply(&self, node: &mut dyn Node, value: &Value<'_>) -> Option<ControlOutcome> {
        node.set_attribute(&self.key, value);
        None
    }
}

/// `@property=...`
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSetter {
    pub property: String,
}

impl Apply for StyleSetter {
    fn apply(&self, node: &mut dyn Node, value: &Value<'_>) -> Option<ControlOutcome> {
        node.set_style_property(&self.property, value);
        None
    }
}

/// `:=...`
#[derive(Debug, Clone, PartialEq)]
pub struct TextSetter;

impl Apply for TextSetter {
    fn apply(&self, node: &mut dyn Node, value: &Value<'_>) -> Option<ControlOutcome> {
        node.set_text_content(value);
        None
    }
}

/// `$show=...`: a falsy value removes the node
///
/// Later clauses of the list still run; writes to a removed node are up to
/// the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowSetter;

impl Apply for ShowSetter {
    fn apply(&self, node: &mut dyn Node, value: &Value<'_>) -> Option<ControlOutcome> {
        if !value.is_truthy() {
            node.remove();
        }
        None
    }
}

/// `$break=...`
#[derive(Debug, Clone, PartialEq)]
pub struct BreakSetter;

impl Apply for BreakSetter {
    fn apply(&self, _node: &mut dyn Node, value: &Value<'_>) -> Option<ControlOutcome> {
        value.is_truthy().then_some(ControlOutcome::Break)
    }
}

/// `$exit=...`
#[derive(Debug, Clone, PartialEq)]
pub struct ExitSetter;

impl Apply for ExitSetter {
    fn apply(&self, _node: &mut dyn Node, value: &Value<'_>) -> Option<ControlOutcome> {
        value.is_truthy().then_some(ControlOutcome::Exit)
    }
}
