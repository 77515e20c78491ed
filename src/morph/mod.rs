//! Tree reconciliation ("morph").
//!
//! Mutates a live subtree in place until it matches a target subtree,
//! reusing live nodes wherever the derived keys line up. Reused nodes keep
//! their identity, so transient state (focus, scroll, uncommitted input)
//! survives on everything that did not move.
//!
//! The target is consumed: its nodes are moved into the live document.
//! Clone the target first if it is needed afterwards.
//!
//! # Push updates
//!
//! Updates pushed by the live session are more conservative:
//! - elements pinned with `LiveUpdate::Preserve` are skipped entirely,
//!   and are never removed from a parent's child list
//! - names in [`PROTECTED`] are left alone unless the element or an
//!   ancestor lists them in `LiveUpdate::Allow`

mod children;
mod lcs;

use std::borrow::Cow;

use rustc_hash::FxHashSet;

use crate::dom::{Document, LiveUpdate, NodeId};

/// Attributes and properties a push update must not overwrite by default.
pub const PROTECTED: [&str; 7] = [
    "state", "style", "hidden", "open", "disabled", "value", "checked",
];

/// Where an update originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Client-initiated (navigation, mount)
    Navigation,
    /// Server-initiated through the live session
    Push,
}

impl UpdateMode {
    pub fn is_push(self) -> bool {
        matches!(self, Self::Push)
    }
}

/// Effective update policy for one element.
#[derive(Debug, Clone)]
struct Policy {
    mode: UpdateMode,
    /// Protected names re-enabled by `LiveUpdate::Allow` on the ancestry
    allowed: FxHashSet<String>,
}

impl Policy {
    /// Resolve the policy for `id` by walking its ancestry (self included).
    ///
    /// `None` when a push update must not touch `id` at all.
    fn resolve(doc: &Document, id: NodeId, mode: UpdateMode) -> Option<Self> {
        let mut policy = Self {
            mode,
            allowed: FxHashSet::default(),
        };
        if !mode.is_push() {
            return Some(policy);
        }
        for node in std::iter::once(id).chain(doc.ancestors(id)) {
            match doc.element(node).map(|el| &el.flags.live_update) {
                Some(LiveUpdate::Preserve) => return None,
                Some(LiveUpdate::Allow(names)) => policy.allowed.extend(names.iter().cloned()),
                _ => {}
            }
        }
        Some(policy)
    }

    /// Narrow the policy for a child element.
    fn enter<'a>(&'a self, doc: &Document, id: NodeId) -> Option<Cow<'a, Self>> {
        if !self.mode.is_push() {
            return Some(Cow::Borrowed(self));
        }
        match doc.element(id).map(|el| &el.flags.live_update) {
            Some(LiveUpdate::Preserve) => None,
            Some(LiveUpdate::Allow(names)) => {
                let mut policy = self.clone();
                policy.allowed.extend(names.iter().cloned());
                Some(Cow::Owned(policy))
            }
            _ => Some(Cow::Borrowed(self)),
        }
    }

    fn permits(&self, name: &str) -> bool {
        !self.mode.is_push() || !PROTECTED.contains(&name) || self.allowed.contains(name)
    }
}

/// Reconcile `live_id` (and its subtree) against `target_id`.
///
/// Both nodes are assumed to be the same slot already (equal keys).
pub fn morph(
    live: &mut Document,
    live_id: NodeId,
    target: &mut Document,
    target_id: NodeId,
    mode: UpdateMode,
) {
    let Some(policy) = Policy::resolve(live, live_id, mode) else {
        crate::debug!("morph"; "skipping pinned subtree");
        return;
    };
    morph_element(live, live_id, target, target_id, &policy);
}

/// Reconcile only the children of `live_parent` against those of
/// `target_parent`; the live parent's own attributes are left as they are.
pub fn morph_children(
    live: &mut Document,
    live_parent: NodeId,
    target: &mut Document,
    target_parent: NodeId,
    mode: UpdateMode,
) {
    let Some(policy) = Policy::resolve(live, live_parent, mode) else {
        crate::debug!("morph"; "skipping pinned subtree");
        return;
    };
    children::reconcile(live, live_parent, target, target_parent, &policy);
}

fn morph_element(
    live: &mut Document,
    live_id: NodeId,
    target: &mut Document,
    target_id: NodeId,
    policy: &Policy,
) {
    reconcile_attrs(live, live_id, target, target_id, policy);
    reconcile_control(live, live_id, target, target_id, policy);
    children::reconcile(live, live_id, target, target_id, policy);
}

fn reconcile_attrs(
    live: &mut Document,
    live_id: NodeId,
    target: &Document,
    target_id: NodeId,
    policy: &Policy,
) {
    let (Some(live_el), Some(target_el)) = (live.element(live_id), target.element(target_id)) else {
        return;
    };

    let mut names: Vec<String> = live_el.attrs.names().map(str::to_string).collect();
    names.extend(
        target_el
            .attrs
            .names()
            .filter(|name| !live_el.attrs.contains(name))
            .map(str::to_string),
    );

    for name in names {
        if !policy.permits(&name) {
            continue;
        }
        match target_el.attrs.get(&name) {
            Some(value) => live.set_attr(live_id, &name, value),
            None => live.remove_attr(live_id, &name),
        }
    }
}

/// Runtime `value`/`checked` can drift from the attributes through user
/// input, so they are reconciled separately.
fn reconcile_control(
    live: &mut Document,
    live_id: NodeId,
    target: &Document,
    target_id: NodeId,
    policy: &Policy,
) {
    let is_control = live.element(live_id).is_some_and(|el| el.is_control());
    let Some(wanted) = target
        .element(target_id)
        .and_then(|el| el.control.as_ref())
        .filter(|_| is_control)
    else {
        return;
    };

    let value = policy.permits("value");
    let checked = policy.permits("checked");
    if value {
        live.write_value(live_id, &wanted.value);
    }
    if checked {
        live.write_checked(live_id, wanted.checked);
    }
    // The server state replaced whatever the user typed
    if value && checked {
        live.mark_clean(live_id);
    }
}

#[cfg(test)]
mod tests;
