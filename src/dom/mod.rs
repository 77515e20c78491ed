//! Live document tree.
//!
//! A generational arena of nodes. Every document owns a synthetic root
//! element (`#document`); parsed top-level nodes hang off it.
//!
//! # Module Structure
//!
//! - `node` - Node payloads, attributes, control properties, live flags
//! - `key` - Derived identity key used as a diffing hint
//! - `parse` - Markup to `Document` (via `tl`)
//! - `render` - `Document` back to markup

mod key;
mod node;
mod parse;
mod render;

pub use key::{KEY_ATTR, NodeKey, NodeKind};
pub use node::{Attrs, Control, Element, LiveFlags, LiveUpdate, NodeData};

use std::ops::Index;

/// Tag name of the synthetic root element.
pub const ROOT_TAG: &str = "#document";

/// Handle to a node inside one `Document`.
///
/// Handles are generational: once a node is freed its slot may be reused,
/// but the old handle never resolves to the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A node with its tree links.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Recorded tree mutation (only collected while tracking is enabled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetAttr { node: NodeId, name: String },
    RemoveAttr { node: NodeId, name: String },
    SetProperty { node: NodeId, name: &'static str },
    Insert { node: NodeId },
    Remove { node: NodeId },
    Move { node: NodeId },
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    mutations: Option<Vec<Mutation>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for Document {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.get(id).expect("stale node id")
    }
}

impl Document {
    /// Create an empty document holding only the synthetic root.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            mutations: None,
        };
        doc.root = doc.alloc(NodeData::Element(Element::new(ROOT_TAG)));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).expect("arena exhausted");
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Resolve a handle, `None` if it is stale.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.get_mut(id).expect("stale node id")
    }

    /// Whether the handle still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of allocated nodes (connected or not).
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release a detached subtree, invalidating every handle into it.
    pub fn free_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Append `child` as last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Unlink a node from its parent. The subtree stays allocated.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|node| node.parent) else {
            return;
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|child| *child != id);
        }
        self.node_mut(id).parent = None;
    }

    /// Move a subtree out of `from` into this document.
    ///
    /// The source nodes are consumed; the returned handle is detached.
    pub fn adopt(&mut self, from: &mut Document, id: NodeId) -> NodeId {
        from.detach(id);
        let Some(source) = from.get_mut(id) else {
            return self.create_text(String::new());
        };
        let data = std::mem::replace(&mut source.data, NodeData::Text(String::new()));
        let children = std::mem::take(&mut source.children);
        from.free_subtree(id);

        let adopted = self.alloc(data);
        for child in children {
            let moved = self.adopt(from, child);
            self.node_mut(moved).parent = Some(adopted);
            self.node_mut(adopted).children.push(moved);
        }
        adopted
    }

    /// Detach and return all children of `parent`, in order.
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.node_mut(parent).children);
        for child in &children {
            self.node_mut(*child).parent = None;
        }
        children
    }

    /// Replace the child list of `parent`.
    ///
    /// Every id must be detached or already a child of `parent`.
    pub(crate) fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for child in &children {
            self.node_mut(*child).parent = Some(parent);
        }
        self.node_mut(parent).children = children;
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Ancestors from the parent upward (self excluded).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Pre-order walk of the subtree rooted at `id` (self included).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Whether the node is reachable from the root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        id == self.root || self.ancestors(id).any(|ancestor| ancestor == self.root)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.get(id).and_then(|node| node.data.as_element())
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.get_mut(id).and_then(|node| node.data.as_element_mut())
    }

    /// First element in document order matching `pred`.
    pub fn find(&self, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.element(*id).is_some_and(&pred))
    }

    /// Element whose `id` attribute equals `value`.
    pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
        self.find(|el| el.attrs.get("id") == Some(value))
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| match &self[node].data {
                NodeData::Text(text) => Some(text.as_str()),
                NodeData::Element(_) => None,
            })
            .collect()
    }

    /// Derived diffing key of a node.
    pub fn key(&self, id: NodeId) -> NodeKey {
        NodeKey::of(&self[id].data)
    }

    // =========================================================================
    // Attributes and properties
    // =========================================================================

    /// Set an attribute, recording a mutation when the value changes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if el.attrs.get(name) == Some(value) {
            return;
        }
        el.attrs.set(name, value);
        self.record(Mutation::SetAttr {
            node: id,
            name: name.to_string(),
        });
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        let removed = self
            .element_mut(id)
            .is_some_and(|el| el.attrs.remove(name).is_some());
        if removed {
            self.record(Mutation::RemoveAttr {
                node: id,
                name: name.to_string(),
            });
        }
    }

    /// Write the runtime `value` of a control (no modification tracking).
    pub(crate) fn write_value(&mut self, id: NodeId, value: &str) {
        let changed = match self.element_mut(id).and_then(|el| el.control.as_mut()) {
            Some(control) if control.value != value => {
                control.value = value.to_string();
                true
            }
            _ => false,
        };
        if changed {
            self.record(Mutation::SetProperty {
                node: id,
                name: "value",
            });
        }
    }

    /// Write the runtime `checked` state of a control (no modification tracking).
    pub(crate) fn write_checked(&mut self, id: NodeId, checked: bool) {
        let changed = match self.element_mut(id).and_then(|el| el.control.as_mut()) {
            Some(control) if control.checked != checked => {
                control.checked = checked;
                true
            }
            _ => false,
        };
        if changed {
            self.record(Mutation::SetProperty {
                node: id,
                name: "checked",
            });
        }
    }

    /// Simulate user input into a control; marks it modified.
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id)
            && let Some(control) = el.control.as_mut()
        {
            control.value = value.to_string();
            el.flags.is_modified = true;
        }
    }

    /// Simulate the user toggling a checkbox or radio; marks it modified.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id)
            && let Some(control) = el.control.as_mut()
        {
            control.checked = checked;
            el.flags.is_modified = true;
        }
    }

    /// Whether any connected element carries unsaved edits.
    pub fn has_modified(&self) -> bool {
        self.descendants(self.root)
            .into_iter()
            .any(|id| self.element(id).is_some_and(|el| el.flags.is_modified))
    }

    /// Forget user edits on one control whose state the server replaced.
    pub(crate) fn mark_clean(&mut self, id: NodeId) {
        if let Some(el) = self.element_mut(id) {
            el.flags.is_modified = false;
        }
    }

    /// Reset modification tracking for the whole document.
    pub fn clear_modified(&mut self) {
        for id in self.descendants(self.root) {
            if let Some(el) = self.element_mut(id) {
                el.flags.is_modified = false;
            }
        }
    }

    pub fn set_live_update(&mut self, id: NodeId, policy: LiveUpdate) {
        if let Some(el) = self.element_mut(id) {
            el.flags.live_update = policy;
        }
    }

    // =========================================================================
    // Mutation log
    // =========================================================================

    /// Start recording mutations (clears any previous log).
    pub fn track_mutations(&mut self) {
        self.mutations = Some(Vec::new());
    }

    /// Drain the recorded mutations.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        self.mutations.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub(crate) fn record(&mut self, mutation: Mutation) {
        if let Some(log) = self.mutations.as_mut() {
            log.push(mutation);
        }
    }
}
