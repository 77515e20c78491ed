//! Derived identity key.
//!
//! Two nodes with equal keys are treated as the same slot by the differ.
//! Keys are hints: they need not be unique and colliding keys may pair
//! the wrong nodes.

use super::NodeData;

/// Attribute carrying the optional diffing hint.
pub const KEY_ATTR: &str = "key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
}

/// `(kind, tag, key-or-text)` composite.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub tag: String,
    pub value: String,
}

impl NodeKey {
    pub fn of(data: &NodeData) -> Self {
        match data {
            NodeData::Element(el) => Self {
                kind: NodeKind::Element,
                tag: el.tag.clone(),
                value: el.attrs.get(KEY_ATTR).unwrap_or_default().to_string(),
            },
            NodeData::Text(text) => Self {
                kind: NodeKind::Text,
                tag: String::new(),
                value: text.clone(),
            },
        }
    }
}
