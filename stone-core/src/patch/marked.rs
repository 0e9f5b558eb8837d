//! Marked-node tier.
//!
//! Render functions put a marker attribute (`data-watch` by default) on
//! every element whose text or attributes may change. This tier pairs the
//! marked descendants of both trees in document order and updates each pair
//! in place. It never inserts or removes nodes; with unequal counts only the
//! common prefix is paired.
//!
//! Pairing stops at the first pair whose nodes sit at different positions in
//! their trees, so a marker that moved never copies text or attributes onto
//! the wrong element. The remaining differences are left to the in-place
//! tiers.

use tracing::trace;

use super::attributes::{sync_attributes, sync_leaf_text};
use super::focus::FocusPath;
use crate::dom::Node;

/// Marked descendants of `root` in document order. The root itself is not
/// included.
pub fn marked_nodes(root: &Node, marker: &str) -> Vec<Node> {
    root.descendants()
        .into_iter()
        .filter(|node| node.has_attribute(marker))
        .collect()
}

/// Apply the marked-node tier. Returns the number of changes made.
pub fn apply_marked(live: &Node, candidate: &Node, marker: &str) -> usize {
    let live_marked = marked_nodes(live, marker);
    let candidate_marked = marked_nodes(candidate, marker);
    if live_marked.len() != candidate_marked.len() {
        trace!(
            live = live_marked.len(),
            candidate = candidate_marked.len(),
            "marked counts differ, pairing prefix"
        );
    }

    let mut changes = 0;
    for (l, c) in live_marked.iter().zip(&candidate_marked) {
        if FocusPath::record(live, l) != FocusPath::record(candidate, c) {
            trace!(node = %l.id(), "marked pairing diverged, stopping");
            break;
        }
        // Overwriting the text of a node with element children would drop
        // those children, so only leaves get their text synced.
        if l.is_leaf() && c.is_leaf() {
            changes += sync_leaf_text(l, c);
        }
        changes += sync_attributes(l, c);
    }
    changes
}
