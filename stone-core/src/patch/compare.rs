//! Tree comparison.
//!
//! Read-only checks that decide which tier a patch needs. None of these
//! mutate either tree.

use crate::dom::Node;

/// Node-for-node equality: tag, attributes (order-insensitive), text.
pub fn trees_equal(live: &Node, candidate: &Node) -> bool {
    match (live.tag_name(), candidate.tag_name()) {
        (None, None) => live.text_content() == candidate.text_content(),
        (Some(a), Some(b)) => {
            if a != b || live.attributes() != candidate.attributes() {
                return false;
            }
            let (left, right) = (live.children(), candidate.children());
            left.len() == right.len() && left.iter().zip(&right).all(|(l, r)| trees_equal(l, r))
        }
        _ => false,
    }
}

/// Whether both trees have the same element structure, so that every
/// difference can be applied without inserting, removing or replacing a node.
///
/// Two leaves (elements without element children) are the same shape
/// whatever their text. Otherwise the child lists must pair up one-to-one:
/// text with text and elements with same-shaped elements.
pub fn same_shape(live: &Node, candidate: &Node) -> bool {
    if live.tag_name() != candidate.tag_name() {
        return false;
    }
    match (live.is_leaf(), candidate.is_leaf()) {
        (true, true) => return true,
        (false, false) => {}
        _ => return false,
    }

    let (left, right) = (live.children(), candidate.children());
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(&right).all(|(l, r)| match (l.is_text(), r.is_text()) {
        (true, true) => true,
        (false, false) => same_shape(l, r),
        _ => false,
    })
}

/// Whether any element pair of two same-shaped trees has differing
/// attributes.
pub fn attributes_differ(live: &Node, candidate: &Node) -> bool {
    if live.attributes() != candidate.attributes() {
        return true;
    }
    if live.is_leaf() && candidate.is_leaf() {
        return false;
    }
    live.children()
        .iter()
        .zip(&candidate.children())
        .any(|(l, r)| l.is_element() && r.is_element() && attributes_differ(l, r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_element;

    fn pair(live: &str, candidate: &str) -> (Node, Node) {
        (parse_element(live).unwrap(), parse_element(candidate).unwrap())
    }

    #[test]
    fn equal_ignores_attribute_order() {
        let (a, b) = pair(
            r#"<div id="x" class="y"><b>1</b></div>"#,
            r#"<div class="y" id="x"><b>1</b></div>"#,
        );
        assert!(trees_equal(&a, &b));
    }

    #[test]
    fn text_difference_breaks_equality_not_shape() {
        let (a, b) = pair("<p><b>1</b>x</p>", "<p><b>2</b>y</p>");
        assert!(!trees_equal(&a, &b));
        assert!(same_shape(&a, &b));
        assert!(!attributes_differ(&a, &b));
    }

    #[test]
    fn leaves_match_whatever_their_text() {
        let (a, b) = pair("<span></span>", "<span>now filled</span>");
        assert!(same_shape(&a, &b));
    }

    #[test]
    fn child_count_or_tag_changes_shape() {
        let (a, b) = pair("<ul><li>1</li></ul>", "<ul><li>1</li><li>2</li></ul>");
        assert!(!same_shape(&a, &b));

        let (a, b) = pair("<div><b>1</b></div>", "<div><i>1</i></div>");
        assert!(!same_shape(&a, &b));

        let (a, b) = pair("<div><b>1</b></div>", "<div>1</div>");
        assert!(!same_shape(&a, &b));
    }

    #[test]
    fn nested_attribute_difference_is_found() {
        let (a, b) = pair(
            r#"<div><p><b class="on">1</b></p></div>"#,
            r#"<div><p><b class="off">1</b></p></div>"#,
        );
        assert!(same_shape(&a, &b));
        assert!(attributes_differ(&a, &b));
    }
}
