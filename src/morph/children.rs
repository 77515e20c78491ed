//! Child list reconciliation.
//!
//! 1. LCS over the derived key sequences splits both lists into matched
//!    pairs separated by gaps.
//! 2. Unmatched live nodes from every gap go into per-key FIFO buckets.
//! 3. Each unmatched target node takes the first bucketed live node with
//!    its key, or is moved in from the target document.
//! 4. Bucketed nodes nobody claimed are removed (pinned ones survive a
//!    push update), then the matched and reused pairs recurse.
//!
//! Duplicate keys pair in arrival order, so two same-keyed siblings that
//! the server swaps non-adjacently can be cross-wired. That is accepted.

use std::collections::VecDeque;
use std::ops::Range;

use rustc_hash::FxHashMap;

use super::{Policy, lcs, morph_element};
use crate::dom::{Document, Mutation, NodeId, NodeKey};

/// Resolution of one unmatched target child.
#[derive(Debug, Clone, Copy)]
enum Resolved {
    /// Index into the live child list
    Reuse(usize),
    /// Move the target node itself into the live tree
    Fresh,
}

#[derive(Debug)]
struct Gap {
    live: Range<usize>,
    target: Range<usize>,
}

pub(super) fn reconcile(
    live: &mut Document,
    live_parent: NodeId,
    target: &mut Document,
    target_parent: NodeId,
    policy: &Policy,
) {
    let live_children = live.children(live_parent).to_vec();
    let target_children = target.take_children(target_parent);

    let live_keys: Vec<NodeKey> = live_children.iter().map(|id| live.key(*id)).collect();
    let target_keys: Vec<NodeKey> = target_children.iter().map(|id| target.key(*id)).collect();

    let matches = lcs::matching(&live_keys, &target_keys);
    let gaps = split_gaps(&matches, live_keys.len(), target_keys.len());

    // Removal candidates from every gap, bucketed by key in live order
    let mut buckets: FxHashMap<&NodeKey, VecDeque<usize>> = FxHashMap::default();
    for gap in &gaps {
        for li in gap.live.clone() {
            buckets.entry(&live_keys[li]).or_default().push_back(li);
        }
    }

    let mut reused = vec![false; live_children.len()];
    let mut resolved = vec![Resolved::Fresh; target_children.len()];
    for gap in &gaps {
        for ti in gap.target.clone() {
            if let Some(li) = buckets
                .get_mut(&target_keys[ti])
                .and_then(VecDeque::pop_front)
            {
                reused[li] = true;
                resolved[ti] = Resolved::Reuse(li);
            }
        }
    }

    let mut order = Vec::with_capacity(target_children.len());
    let mut pairs = Vec::with_capacity(target_children.len());
    let mut removed = Vec::new();

    for (gi, gap) in gaps.iter().enumerate() {
        for ti in gap.target.clone() {
            match resolved[ti] {
                Resolved::Reuse(li) => {
                    let id = live_children[li];
                    live.record(Mutation::Move { node: id });
                    order.push(id);
                    pairs.push((id, target_children[ti]));
                }
                Resolved::Fresh => {
                    let id = live.adopt(target, target_children[ti]);
                    live.record(Mutation::Insert { node: id });
                    order.push(id);
                }
            }
        }

        for li in gap.live.clone().filter(|li| !reused[*li]) {
            let id = live_children[li];
            let pinned = policy.mode.is_push()
                && live
                    .element(id)
                    .is_some_and(|el| el.flags.live_update.is_preserve());
            if pinned {
                order.push(id);
            } else {
                removed.push(id);
            }
        }

        if let Some(&(li, ti)) = matches.get(gi) {
            order.push(live_children[li]);
            pairs.push((live_children[li], target_children[ti]));
        }
    }

    for id in removed {
        live.record(Mutation::Remove { node: id });
        live.free_subtree(id);
    }
    live.set_children(live_parent, order);

    for (live_id, target_id) in pairs {
        let both_elements =
            live.element(live_id).is_some() && target.element(target_id).is_some();
        if !both_elements {
            continue;
        }
        if let Some(child_policy) = policy.enter(live, live_id) {
            morph_element(live, live_id, target, target_id, &child_policy);
        }
    }
}

/// Gaps between consecutive matches; `gaps[i]` precedes `matches[i]`,
/// the last gap trails the final match.
fn split_gaps(matches: &[(usize, usize)], live_len: usize, target_len: usize) -> Vec<Gap> {
    let mut gaps = Vec::with_capacity(matches.len() + 1);
    let (mut li, mut ti) = (0, 0);
    for &(lm, tm) in matches {
        gaps.push(Gap {
            live: li..lm,
            target: ti..tm,
        });
        li = lm + 1;
        ti = tm + 1;
    }
    gaps.push(Gap {
        live: li..live_len,
        target: ti..target_len,
    });
    gaps
}
