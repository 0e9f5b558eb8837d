//! Nodes
//!
//! A [`Node`] is a cheap, clonable handle to an element or a text node.
//! Clones share the same underlying node; equality is identity.
//!
//! # Ownership
//!
//! Parents own their children through strong handles, children point back to
//! their parent through a weak one. Detaching a subtree therefore never leaks
//! and never leaves a dangling parent pointer.
//!
//! # Listeners
//!
//! Listeners belong to the node they were added to. Any operation that keeps
//! the node (attribute or text updates) keeps its listeners; replacing the
//! node with a fresh one drops them. [`Node::deep_clone`] does not copy
//! listeners, matching `cloneNode(true)`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::trace;

use super::markup;

/// Counter for generating unique node IDs.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_node_id() -> NodeId {
    NodeId(NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier of a node, stable for the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by [`Node::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A dispatched event.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    target: Node,
}

impl Event {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The node the event was dispatched on. Bubbling does not change it.
    pub fn target(&self) -> &Node {
        &self.target
    }
}

type Handler = Rc<dyn Fn(&Event)>;

struct Listener {
    id: ListenerId,
    event_type: String,
    handler: Handler,
}

enum Kind {
    Element {
        tag: String,
        attributes: RefCell<IndexMap<String, String>>,
        listeners: RefCell<Vec<Listener>>,
    },
    Text(RefCell<String>),
}

struct NodeData {
    id: NodeId,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
    kind: Kind,
}

/// Shared handle to a node of the host document.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

/// Non-owning handle to a node.
#[derive(Clone, Default)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl Node {
    fn with_kind(kind: Kind) -> Self {
        Self(Rc::new(NodeData {
            id: next_node_id(),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            kind,
        }))
    }

    /// Create a detached element. The tag is lowercased.
    pub fn element(tag: &str) -> Self {
        Self::with_kind(Kind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// Create a detached text node.
    pub fn text(data: impl Into<String>) -> Self {
        Self::with_kind(Kind::Text(RefCell::new(data.into())))
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, Kind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.kind, Kind::Text(_))
    }

    /// Lowercase tag name, `None` for text nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.kind {
            Kind::Element { tag, .. } => Some(tag),
            Kind::Text(_) => None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|own| own.eq_ignore_ascii_case(tag))
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.0.kind {
            Kind::Element { attributes, .. } => attributes.borrow().get(name).cloned(),
            Kind::Text(_) => None,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        match &self.0.kind {
            Kind::Element { attributes, .. } => attributes.borrow().contains_key(name),
            Kind::Text(_) => false,
        }
    }

    /// Snapshot of all attributes in insertion order.
    pub fn attributes(&self) -> IndexMap<String, String> {
        match &self.0.kind {
            Kind::Element { attributes, .. } => attributes.borrow().clone(),
            Kind::Text(_) => IndexMap::new(),
        }
    }

    pub fn attribute_count(&self) -> usize {
        match &self.0.kind {
            Kind::Element { attributes, .. } => attributes.borrow().len(),
            Kind::Text(_) => 0,
        }
    }

    /// Set an attribute. Returns `true` if the stored value changed.
    /// Text nodes ignore the call.
    pub fn set_attribute(&self, name: &str, value: &str) -> bool {
        let Kind::Element { attributes, .. } = &self.0.kind else {
            return false;
        };
        let mut attributes = attributes.borrow_mut();
        if attributes.get(name).map(String::as_str) == Some(value) {
            return false;
        }
        attributes.insert(name.to_string(), value.to_string());
        true
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&self, name: &str) -> bool {
        match &self.0.kind {
            Kind::Element { attributes, .. } => attributes.borrow_mut().shift_remove(name).is_some(),
            Kind::Text(_) => false,
        }
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    /// Child nodes (elements and text) in order.
    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn element_children(&self) -> Vec<Node> {
        self.0
            .children
            .borrow()
            .iter()
            .filter(|child| child.is_element())
            .cloned()
            .collect()
    }

    pub fn first_element_child(&self) -> Option<Node> {
        self.0.children.borrow().iter().find(|child| child.is_element()).cloned()
    }

    /// An element without element children. Text nodes are never leaves.
    pub fn is_leaf(&self) -> bool {
        self.is_element() && !self.0.children.borrow().iter().any(Node::is_element)
    }

    /// Append `child`, moving it out of its current parent first.
    ///
    /// Appending a node into its own subtree is ignored.
    pub fn append_child(&self, child: &Node) {
        if self.is_text() || child.contains(self) {
            trace!(parent = %self.id(), child = %child.id(), "refusing append");
            return;
        }
        child.detach();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Remove a direct child. Returns `false` if `child` is not a child of `self`.
    pub fn remove_child(&self, child: &Node) -> bool {
        let removed = {
            let mut children = self.0.children.borrow_mut();
            match children.iter().position(|c| c.ptr_eq(child)) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            *child.0.parent.borrow_mut() = Weak::new();
        }
        removed
    }

    /// Put `new` at the position of `old`.
    pub fn replace_child(&self, new: &Node, old: &Node) -> bool {
        if new.ptr_eq(old) {
            return self.0.children.borrow().iter().any(|c| c.ptr_eq(old));
        }
        if new.contains(self) {
            return false;
        }
        let Some(index) = self.0.children.borrow().iter().position(|c| c.ptr_eq(old)) else {
            return false;
        };
        new.detach();
        // Detaching `new` may have shifted `old` if both shared this parent.
        let index = self
            .0
            .children
            .borrow()
            .iter()
            .position(|c| c.ptr_eq(old))
            .unwrap_or(index);
        *new.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        *old.0.parent.borrow_mut() = Weak::new();
        self.0.children.borrow_mut()[index] = new.clone();
        true
    }

    /// Remove this node from its parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Topmost ancestor, `self` when detached.
    pub fn root(&self) -> Node {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Whether `other` is `self` or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// All descendants in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Concatenated text of the subtree.
    pub fn text_content(&self) -> String {
        match &self.0.kind {
            Kind::Text(data) => data.borrow().clone(),
            Kind::Element { .. } => {
                let mut out = String::new();
                for node in self.descendants() {
                    if let Kind::Text(data) = &node.0.kind {
                        out.push_str(&data.borrow());
                    }
                }
                out
            }
        }
    }

    /// Replace the content. For elements all children are dropped and a
    /// single text node (if `text` is non-empty) takes their place.
    pub fn set_text_content(&self, text: &str) {
        match &self.0.kind {
            Kind::Text(data) => *data.borrow_mut() = text.to_string(),
            Kind::Element { .. } => {
                let old = std::mem::take(&mut *self.0.children.borrow_mut());
                for child in &old {
                    *child.0.parent.borrow_mut() = Weak::new();
                }
                if !text.is_empty() {
                    self.append_child(&Node::text(text));
                }
            }
        }
    }

    /// Copy the subtree. Listeners are not copied.
    pub fn deep_clone(&self) -> Node {
        let copy = match &self.0.kind {
            Kind::Text(data) => return Node::text(data.borrow().clone()),
            Kind::Element { tag, attributes, .. } => {
                let copy = Node::element(tag);
                if let Kind::Element { attributes: target, .. } = &copy.0.kind {
                    *target.borrow_mut() = attributes.borrow().clone();
                }
                copy
            }
        };
        for child in self.children() {
            copy.append_child(&child.deep_clone());
        }
        copy
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Attach a listener. Text nodes cannot hold listeners and return `None`.
    pub fn add_event_listener<F>(&self, event_type: &str, handler: F) -> Option<ListenerId>
    where
        F: Fn(&Event) + 'static,
    {
        let Kind::Element { listeners, .. } = &self.0.kind else {
            return None;
        };
        let id = ListenerId(LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed));
        listeners.borrow_mut().push(Listener {
            id,
            event_type: event_type.to_string(),
            handler: Rc::new(handler),
        });
        Some(id)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let Kind::Element { listeners, .. } = &self.0.kind else {
            return false;
        };
        let mut listeners = listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|listener| listener.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        match &self.0.kind {
            Kind::Element { listeners, .. } => listeners.borrow().len(),
            Kind::Text(_) => 0,
        }
    }

    /// Dispatch an event at this node and bubble it through the ancestors.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch_event(&self, event_type: &str) -> usize {
        let event = Event {
            event_type: event_type.to_string(),
            target: self.clone(),
        };

        let mut invoked = 0;
        let mut current = Some(self.clone());
        while let Some(node) = current {
            // Snapshot so handlers may add or remove listeners.
            let handlers: Vec<Handler> = match &node.0.kind {
                Kind::Element { listeners, .. } => listeners
                    .borrow()
                    .iter()
                    .filter(|listener| listener.event_type == event_type)
                    .map(|listener| Rc::clone(&listener.handler))
                    .collect(),
                Kind::Text(_) => Vec::new(),
            };
            for handler in handlers {
                handler(&event);
                invoked += 1;
            }
            current = node.parent();
        }
        invoked
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        markup::write_node(self, &mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            markup::write_node(&child, &mut out);
        }
        out
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            Kind::Element { tag, .. } => write!(f, "<{}>{}", tag, self.id()),
            Kind::Text(data) => write!(f, "{:?}{}", data.borrow(), self.id()),
        }
    }
}

impl fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(node) => write!(f, "WeakNode({node:?})"),
            None => f.write_str("WeakNode(dropped)"),
        }
    }
}
