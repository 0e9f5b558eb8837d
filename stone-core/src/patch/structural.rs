//! Structural tier.
//!
//! Positional reconciliation of two trees whose shapes differ. Each child
//! position is handled on its own:
//!
//! | live      | candidate             | action                                |
//! |-----------|-----------------------|---------------------------------------|
//! | text      | text                  | overwrite data                        |
//! | element   | element, same tag     | in place if same shape, else recurse  |
//! | any       | any other             | replace                               |
//! | absent    | present               | append                                |
//! | present   | absent                | remove                                |
//!
//! There is no move detection. Candidate nodes are moved into the live tree
//! rather than cloned, since the candidate is discarded afterwards.
//!
//! When a document is known, removed subtrees are unmounted and inserted
//! ones upgraded, so nested components keep a correct lifecycle.

use tracing::{error, trace};

use super::attributes::{apply_in_place, sync_attributes};
use super::compare::{same_shape, trees_equal};
use crate::dom::{Document, Node};

pub fn reconcile(live: &Node, candidate: &Node, document: Option<&Document>) -> usize {
    let mut changes = sync_attributes(live, candidate);

    let live_children = live.children();
    let candidate_children = candidate.children();
    let positions = live_children.len().max(candidate_children.len());

    for index in 0..positions {
        match (live_children.get(index), candidate_children.get(index)) {
            (Some(l), Some(c)) => changes += reconcile_pair(live, l, c, document),
            (None, Some(c)) => {
                trace!(parent = %live.id(), index, "appending node");
                live.append_child(c);
                adopt(document, c);
                changes += 1;
            }
            (Some(l), None) => {
                trace!(parent = %live.id(), index, "removing node");
                release(document, l);
                live.remove_child(l);
                changes += 1;
            }
            (None, None) => {}
        }
    }
    changes
}

fn reconcile_pair(parent: &Node, live: &Node, candidate: &Node, document: Option<&Document>) -> usize {
    if live.is_text() && candidate.is_text() {
        let text = candidate.text_content();
        if live.text_content() == text {
            return 0;
        }
        live.set_text_content(&text);
        return 1;
    }

    if live.is_element() && live.tag_name() == candidate.tag_name() {
        if trees_equal(live, candidate) {
            return 0;
        }
        if same_shape(live, candidate) {
            return apply_in_place(live, candidate);
        }
        return reconcile(live, candidate, document);
    }

    trace!(parent = %parent.id(), old = ?live, new = ?candidate, "replacing node");
    release(document, live);
    parent.replace_child(candidate, live);
    adopt(document, candidate);
    1
}

fn release(document: Option<&Document>, node: &Node) {
    if let Some(document) = document {
        document.release(node);
    }
}

fn adopt(document: Option<&Document>, node: &Node) {
    if let Some(document) = document {
        if let Err(err) = document.adopt(node) {
            error!(node = %node.id(), error = %err, "failed to upgrade inserted node");
        }
    }
}
