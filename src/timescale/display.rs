//! Display text overlay for scale groups

use serde::{Deserialize, Serialize};

use super::builder::ScaleGroup;

/// One entry of a display overlay
///
/// Deserializes from `"text"` or `{"text": .., "subGroup": [..]}`; `null`
/// entries in a level leave the matching group alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayEntry {
    Text(String),
    Group {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(rename = "subGroup", default, skip_serializing_if = "Vec::is_empty")]
        sub_group: Vec<Option<DisplayEntry>>,
    },
}

/// Overlay `entries` onto `groups` position by position.
pub(crate) fn set_display(groups: &mut [ScaleGroup], entries: &[Option<DisplayEntry>]) {
    for (group, entry) in groups.iter_mut().zip(entries) {
        match entry {
            None => {}
            Some(DisplayEntry::Text(text)) => group.set_text(text),
            Some(DisplayEntry::Group { text, sub_group }) => {
                if let Some(text) = text {
                    group.set_text(text);
                }
                set_display(group.children_mut(), sub_group);
            }
        }
    }
}

pub(crate) fn restore_display(groups: &mut [ScaleGroup]) {
    for group in groups {
        group.reset_text();
        restore_display(group.children_mut());
    }
}
