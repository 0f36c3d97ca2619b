//! Scale tree construction from template descriptors

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::errors::ScaleError;
use crate::types::{parse_time, time_origin};

use super::layout::ScaleItem;

/// One scale element of the template
///
/// `path_key` joins the group path with `-`: `2024-Q1-Jan` attaches a node
/// at `2024 / Q1 / Jan`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleDescriptor {
    pub path_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_weight: Option<f64>,
    #[serde(default, rename = "start", skip_serializing_if = "Option::is_none")]
    pub start_text: Option<String>,
    #[serde(default, rename = "end", skip_serializing_if = "Option::is_none")]
    pub end_text: Option<String>,
    /// Display text of the node as authored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ScaleDescriptor {
    pub fn new(path_key: impl Into<String>) -> Self {
        ScaleDescriptor {
            path_key: path_key.into(),
            ..Default::default()
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.unit_weight = Some(weight);
        self
    }

    pub fn start(mut self, text: impl Into<String>) -> Self {
        self.start_text = Some(text.into());
        self
    }

    pub fn end(mut self, text: impl Into<String>) -> Self {
        self.end_text = Some(text.into());
        self
    }

    pub fn label(mut self, text: impl Into<String>) -> Self {
        self.label = Some(text.into());
        self
    }

    fn layout_unit(&self) -> f64 {
        self.unit_weight
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(defaults::LAYOUT_UNIT)
    }
}

/// A node of the display tree
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleGroup {
    key: String,
    /// Text captured when a descriptor attached this node
    default_text: Option<String>,
    text: Option<String>,
    /// Index of the attaching descriptor
    descriptor: Option<usize>,
    leaf: Option<usize>,
    children: Vec<ScaleGroup>,
}

impl ScaleGroup {
    fn new(key: &str) -> Self {
        ScaleGroup {
            key: key.to_string(),
            default_text: None,
            text: None,
            descriptor: None,
            leaf: None,
            children: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn default_text(&self) -> Option<&str> {
        self.default_text.as_deref()
    }

    pub fn descriptor(&self) -> Option<usize> {
        self.descriptor
    }

    /// Index into [`TimeScales::items`](super::TimeScales::items)
    pub fn leaf(&self) -> Option<usize> {
        self.leaf
    }

    pub fn children(&self) -> &[ScaleGroup] {
        &self.children
    }

    pub fn child(&self, key: &str) -> Option<&ScaleGroup> {
        self.children.iter().find(|g| g.key == key)
    }

    pub(crate) fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }

    pub(crate) fn reset_text(&mut self) {
        self.text.clone_from(&self.default_text);
    }

    pub(crate) fn children_mut(&mut self) -> &mut [ScaleGroup] {
        &mut self.children
    }
}

/// Output of [`build_tree`]
#[derive(Debug)]
pub(crate) struct ScaleTree {
    pub groups: Vec<ScaleGroup>,
    pub items: Vec<ScaleItem>,
    pub unit_count: f64,
}

/// Build the display tree and the flat leaf sequence.
///
/// Items carry their template boundaries; contiguity is resolved by the
/// caller.
pub(crate) fn build_tree(descriptors: &[ScaleDescriptor]) -> Result<ScaleTree, ScaleError> {
    let mut groups = Vec::new();
    for (index, descriptor) in descriptors.iter().enumerate() {
        let path: Vec<&str> = descriptor.path_key.split('-').collect();
        attach(&mut groups, &path, index, descriptor.label.as_deref());
    }

    let mut leaves = Vec::new();
    collect_leaves(&groups, &mut leaves);
    if leaves.is_empty() {
        return Err(ScaleError::NoScaleItems);
    }
    leaves.sort_unstable();

    let mut slot = vec![None; descriptors.len()];
    for (leaf, &descriptor) in leaves.iter().enumerate() {
        slot[descriptor] = Some(leaf);
    }
    assign_leaves(&mut groups, &slot);

    let items: Vec<ScaleItem> = leaves
        .iter()
        .map(|&i| item_from(&descriptors[i]))
        .collect();
    let unit_count = items.iter().map(ScaleItem::layout_unit).sum();
    Ok(ScaleTree {
        groups,
        items,
        unit_count,
    })
}

fn attach(level: &mut Vec<ScaleGroup>, path: &[&str], index: usize, label: Option<&str>) {
    let Some((key, rest)) = path.split_first() else {
        return;
    };
    let pos = match level.iter().position(|g| g.key == *key) {
        Some(pos) => pos,
        None => {
            level.push(ScaleGroup::new(key));
            level.len() - 1
        }
    };
    let group = &mut level[pos];
    if rest.is_empty() {
        // A later descriptor with the same path replaces the node but keeps
        // the sub-groups already hanging off it.
        group.descriptor = Some(index);
        group.default_text = Some(label.unwrap_or_default().to_string());
        group.text.clone_from(&group.default_text);
    } else {
        attach(&mut group.children, rest, index, label);
    }
}

fn collect_leaves(level: &[ScaleGroup], out: &mut Vec<usize>) {
    for group in level {
        match group.descriptor {
            Some(index) if group.children.is_empty() => out.push(index),
            _ => collect_leaves(&group.children, out),
        }
    }
}

fn assign_leaves(level: &mut [ScaleGroup], slot: &[Option<usize>]) {
    for group in level {
        group.leaf = match group.descriptor {
            Some(index) if group.children.is_empty() => slot[index],
            _ => None,
        };
        assign_leaves(&mut group.children, slot);
    }
}

fn item_from(descriptor: &ScaleDescriptor) -> ScaleItem {
    let start = descriptor
        .start_text
        .as_deref()
        .and_then(parse_time)
        .unwrap_or_else(time_origin);
    let end = descriptor.end_text.as_deref().and_then(parse_time);
    ScaleItem::new(descriptor.layout_unit(), start, end)
}
