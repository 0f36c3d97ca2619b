//! Applying clause lists to nodes

use serde_json::Value as Json;

use crate::errors::EvalFault;
use crate::log::warn;

use super::control::ControlOutcome;
use super::eval::Inputs;
use super::setter::{Apply, Node};
use super::ClauseList;

/// Where the caller is when it looks at an [`Evaluation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Between clauses of the list that produced the outcome
    ClauseList,
    /// Between nodes, items or projects of the render pass
    RenderPass,
}

/// What one clause list invocation did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Set when a Break or Exit stopped the list
    pub outcome: Option<ControlOutcome>,
    /// Runtime faults of individual clauses; the list kept going
    pub faults: Vec<EvalFault>,
}

impl Evaluation {
    /// Should iteration at `boundary` stop?
    ///
    /// Break unwinds only the clause list, Exit unwinds the render pass too.
    pub fn stops_at(&self, boundary: Boundary) -> bool {
        match self.outcome {
            Some(ControlOutcome::Exit) => true,
            Some(ControlOutcome::Break) => boundary == Boundary::ClauseList,
            None => false,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

impl ClauseList {
    /// Run every clause in order against `node`.
    pub fn evaluate(
        &self,
        node: &mut dyn Node,
        project: &Json,
        item: &Json,
        layout: &Json,
    ) -> Evaluation {
        let inputs = Inputs {
            project,
            item,
            layout,
        };
        let mut evaluation = Evaluation::default();
        for clause in &self.clauses {
            let outcome = match clause.program.run(inputs) {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(clause = clause.source.as_str(), error = %error, "dynamic expression failed");
                    evaluation.faults.push(EvalFault {
                        expression: clause.source.clone(),
                        error,
                    });
                    continue;
                }
            };
            let signal = outcome.control();
            let Some(value) = outcome.value() else {
                continue;
            };
            let raised = clause
                .setter
                .as_ref()
                .and_then(|setter| setter.apply(node, &value));
            if let Some(stop) = raised.or(signal) {
                evaluation.outcome = Some(stop);
                break;
            }
        }
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Value;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Node for Recorder {
        fn set_attribute(&mut self, key: &str, value: &Value<'_>) {
            self.calls.push(format!("attr {key}={value}"));
        }
        fn set_style_property(&mut self, property: &str, value: &Value<'_>) {
            self.calls.push(format!("style {property}={value}"));
        }
        fn set_text_content(&mut self, value: &Value<'_>) {
            self.calls.push(format!("text {value}"));
        }
        fn remove(&mut self) {
            self.calls.push("remove".into());
        }
    }

    fn evaluate(text: &str, item: Json) -> (Evaluation, Vec<String>) {
        let list = ClauseList::compile(text);
        let mut node = Recorder::default();
        let empty = json!({});
        let evaluation = list.evaluate(&mut node, &empty, &item, &empty);
        (evaluation, node.calls)
    }

    #[test]
    fn plain_clauses_apply_in_order() {
        let (evaluation, calls) = evaluate("a=1; @b=item.x; :=item.x + 1", json!({ "x": 2 }));
        assert_eq!(evaluation, Evaluation::default());
        assert_eq!(calls, vec!["attr a=1", "style b=2", "text 3"]);
    }

    #[test]
    fn fault_is_isolated() {
        let (evaluation, calls) = evaluate("a=item.no.such; b=2", json!({}));
        assert_eq!(calls, vec!["attr b=2"]);
        assert_eq!(evaluation.outcome, None);
        assert_eq!(evaluation.faults.len(), 1);
        assert_eq!(evaluation.faults[0].expression, "a=item.no.such");
    }

    #[test]
    fn stops_at_boundaries() {
        let brk = Evaluation {
            outcome: Some(ControlOutcome::Break),
            faults: vec![],
        };
        assert!(brk.stops_at(Boundary::ClauseList));
        assert!(!brk.stops_at(Boundary::RenderPass));
        let exit = Evaluation {
            outcome: Some(ControlOutcome::Exit),
            faults: vec![],
        };
        assert!(exit.stops_at(Boundary::ClauseList));
        assert!(exit.stops_at(Boundary::RenderPass));
        assert!(!Evaluation::default().stops_at(Boundary::ClauseList));
    }

    #[test]
    fn break_setter_overrides_program_signal() {
        let (evaluation, calls) = evaluate("$break=$.exit(1, 1); a=2", json!({}));
        assert_eq!(evaluation.outcome, Some(ControlOutcome::Break));
        assert!(calls.is_empty());
    }
}
