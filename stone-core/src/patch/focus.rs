//! Focus preservation across structural patches.
//!
//! Before a structural pass the focused element's position is recorded as a
//! path of `(tag, element index)` steps from the patched root. Afterwards the
//! same path is walked again and, if it still leads to an element with the
//! same tags, that element gets focus.

use std::fmt;

use smallvec::SmallVec;

use crate::dom::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusPath {
    steps: SmallVec<[(String, usize); 8]>,
}

impl FocusPath {
    /// Path from `root` to `target`, or `None` if `target` is not inside
    /// `root`.
    pub fn record(root: &Node, target: &Node) -> Option<Self> {
        if !root.contains(target) {
            return None;
        }

        let mut steps = SmallVec::new();
        let mut current = target.clone();
        while !current.ptr_eq(root) {
            let parent = current.parent()?;
            let index = parent
                .element_children()
                .iter()
                .position(|child| child.ptr_eq(&current))?;
            steps.push((current.tag_name()?.to_string(), index));
            current = parent;
        }
        steps.reverse();
        Some(Self { steps })
    }

    /// Element at the end of the path under `root`, if every step still
    /// exists with the recorded tag.
    pub fn resolve(&self, root: &Node) -> Option<Node> {
        let mut current = root.clone();
        for (tag, index) in &self.steps {
            let next = current.element_children().into_iter().nth(*index)?;
            if !next.has_tag(tag) {
                return None;
            }
            current = next;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for FocusPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(":root")?;
        for (tag, index) in &self.steps {
            write!(f, " > {tag}[{index}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_element;

    #[test]
    fn records_and_resolves() {
        let root = parse_element("<form><p>hi</p><div><input /><input /></div></form>").unwrap();
        let second = root.query_selector_all("input").unwrap()[1].clone();

        let path = FocusPath::record(&root, &second).unwrap();
        assert_eq!(path.to_string(), ":root > div[1] > input[1]");
        assert_eq!(path.resolve(&root), Some(second));
    }

    #[test]
    fn resolves_in_a_rebuilt_tree() {
        let before = parse_element("<div><button>a</button><button>b</button></div>").unwrap();
        let after = parse_element("<div><button>x</button><button>y</button><i></i></div>").unwrap();
        let target = before.element_children()[1].clone();

        let path = FocusPath::record(&before, &target).unwrap();
        let found = path.resolve(&after).unwrap();
        assert_eq!(found.text_content(), "y");
    }

    #[test]
    fn broken_path_resolves_to_none() {
        let before = parse_element("<div><button>a</button></div>").unwrap();
        let after = parse_element("<div><a>a</a></div>").unwrap();
        let path = FocusPath::record(&before, &before.element_children()[0]).unwrap();
        assert_eq!(path.resolve(&after), None);
    }

    #[test]
    fn outside_root_is_not_recorded() {
        let root = parse_element("<div></div>").unwrap();
        let other = parse_element("<p></p>").unwrap();
        assert!(FocusPath::record(&root, &other).is_none());

        let path = FocusPath::record(&root, &root).unwrap();
        assert!(path.is_empty());
        assert_eq!(path.resolve(&root), Some(root));
    }
}
