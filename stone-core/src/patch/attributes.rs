//! In-place updates: attributes and leaf text.
//!
//! Used by the text and attribute tiers, and by the structural tier for
//! subtrees that kept their shape. Nothing here inserts, removes or replaces
//! a node, so listeners and focus are untouched.

use tracing::trace;

use crate::dom::Node;

/// Make `live`'s attributes equal to `candidate`'s. Returns the number of
/// attributes set or removed.
pub fn sync_attributes(live: &Node, candidate: &Node) -> usize {
    let wanted = candidate.attributes();
    let mut changes = 0;

    for (name, value) in &wanted {
        if live.set_attribute(name, value) {
            trace!(node = %live.id(), attribute = %name, "set attribute");
            changes += 1;
        }
    }
    let stale: Vec<String> = live
        .attributes()
        .into_keys()
        .filter(|name| !wanted.contains_key(name))
        .collect();
    for name in stale {
        if live.remove_attribute(&name) {
            trace!(node = %live.id(), attribute = %name, "removed attribute");
            changes += 1;
        }
    }
    changes
}

/// Overwrite the text of a leaf pair if it differs.
pub fn sync_leaf_text(live: &Node, candidate: &Node) -> usize {
    let text = candidate.text_content();
    if live.text_content() == text {
        return 0;
    }
    trace!(node = %live.id(), "overwrote text");
    live.set_text_content(&text);
    1
}

/// Apply every difference between two same-shaped trees in place.
pub fn apply_in_place(live: &Node, candidate: &Node) -> usize {
    let mut changes = sync_attributes(live, candidate);

    if live.is_leaf() && candidate.is_leaf() {
        return changes + sync_leaf_text(live, candidate);
    }

    for (l, c) in live.children().iter().zip(&candidate.children()) {
        if l.is_text() && c.is_text() {
            changes += sync_leaf_text(l, c);
        } else if l.is_element() && c.is_element() {
            changes += apply_in_place(l, c);
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_element;

    #[test]
    fn sync_counts_sets_and_removals() {
        let live = parse_element(r#"<a href="/old" class="x" target="_blank">go</a>"#).unwrap();
        let candidate = parse_element(r#"<a href="/new" class="x" rel="next">go</a>"#).unwrap();

        // href updated, rel added, target removed
        assert_eq!(sync_attributes(&live, &candidate), 3);
        assert_eq!(live.attribute("href").as_deref(), Some("/new"));
        assert!(!live.has_attribute("target"));
        assert_eq!(sync_attributes(&live, &candidate), 0);
    }

    #[test]
    fn in_place_keeps_node_identity() {
        let live = parse_element(r#"<div><p class="a">one</p>tail</div>"#).unwrap();
        let candidate = parse_element(r#"<div><p class="b">two</p>end</div>"#).unwrap();
        let p = live.first_element_child().unwrap();

        assert_eq!(apply_in_place(&live, &candidate), 3);
        assert_eq!(live.outer_html(), r#"<div><p class="b">two</p>end</div>"#);
        assert!(live.first_element_child().unwrap().ptr_eq(&p));
    }

    #[test]
    fn leaf_can_become_empty() {
        let live = parse_element("<span>3</span>").unwrap();
        let candidate = parse_element("<span></span>").unwrap();
        assert_eq!(apply_in_place(&live, &candidate), 1);
        assert_eq!(live.child_count(), 0);
    }
}
