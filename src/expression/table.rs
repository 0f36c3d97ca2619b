//! Compiled dynamic attributes of one template

use std::collections::HashMap;

use serde_json::Value as Json;

use crate::errors::CompileError;
use crate::log::debug;

use super::evaluator::Evaluation;
use super::setter::Node;
use super::ClauseList;

/// Handle to a compiled attribute text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(usize);

impl ExpressionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Every distinct attribute text compiled once per template load
#[derive(Debug, Default)]
pub struct ExpressionTable {
    lists: Vec<ClauseList>,
    by_source: HashMap<String, ExpressionId>,
}

impl ExpressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source` unless an identical text was registered before.
    pub fn register(&mut self, source: &str) -> ExpressionId {
        if let Some(id) = self.by_source.get(source) {
            return *id;
        }
        let id = ExpressionId(self.lists.len());
        let list = ClauseList::compile(source);
        debug!(id = id.0, clauses = list.len(), "compiled dynamic attribute");
        self.lists.push(list);
        self.by_source.insert(source.to_string(), id);
        id
    }

    pub fn get(&self, id: ExpressionId) -> Option<&ClauseList> {
        self.lists.get(id.0)
    }

    /// Evaluate a registered list; `None` for an id from another table
    pub fn evaluate(
        &self,
        id: ExpressionId,
        node: &mut dyn Node,
        project: &Json,
        item: &Json,
        layout: &Json,
    ) -> Option<Evaluation> {
        self.get(id)
            .map(|list| list.evaluate(node, project, item, layout))
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Compile failures of every registered text
    pub fn diagnostics(&self) -> impl Iterator<Item = (ExpressionId, &CompileError)> {
        self.lists.iter().enumerate().flat_map(|(i, list)| {
            list.diagnostics()
                .iter()
                .map(move |error| (ExpressionId(i), error))
        })
    }
}
