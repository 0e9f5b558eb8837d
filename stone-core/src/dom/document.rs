//! Document
//!
//! The host side of the runtime: a `<body>` tree, the focused element, a bag
//! of global properties and the custom element registry.
//!
//! # Element registration
//!
//! [`Document::define`] takes a tag and three callbacks:
//!
//! - `construct` builds per-instance data when an element is upgraded,
//! - `mount` runs right after, with the element connected,
//! - `unmount` runs when the element leaves the document.
//!
//! Elements are upgraded when they enter the document through
//! [`Document::append`] / [`Document::load`], or at definition time if
//! they are already connected. Instance data lives in the document keyed by
//! node ID and is taken out of the map while a callback runs, so callbacks
//! may use the document freely.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::markup::parse_fragment;
use super::node::{Node, NodeId, WeakNode};
use super::selector::Selector;
use crate::config::RuntimeConfig;
use crate::error::Result;

type Construct = Box<dyn Fn() -> Result<Box<dyn Any>>>;
type Mount = Box<dyn Fn(&Document, &Node, &mut dyn Any)>;
type Unmount = Box<dyn Fn(&Node, &mut dyn Any)>;

/// The three lifecycle callbacks of a custom element.
pub struct ElementCallbacks {
    construct: Construct,
    mount: Mount,
    unmount: Unmount,
}

impl ElementCallbacks {
    pub fn new<C, M, U>(construct: C, mount: M, unmount: U) -> Self
    where
        C: Fn() -> Result<Box<dyn Any>> + 'static,
        M: Fn(&Document, &Node, &mut dyn Any) + 'static,
        U: Fn(&Node, &mut dyn Any) + 'static,
    {
        Self {
            construct: Box::new(construct),
            mount: Box::new(mount),
            unmount: Box::new(unmount),
        }
    }
}

impl fmt::Debug for ElementCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElementCallbacks")
    }
}

struct DocumentInner {
    body: Node,
    config: RuntimeConfig,
    focused: RefCell<WeakNode>,
    globals: RefCell<Map<String, Value>>,
    definitions: RefCell<IndexMap<String, Rc<ElementCallbacks>>>,
    instances: RefCell<HashMap<NodeId, Box<dyn Any>>>,
}

/// Shared handle to an in-memory document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// Non-owning handle to a document.
#[derive(Clone, Default)]
pub struct WeakDocument(Weak<DocumentInner>);

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.0.upgrade().map(|inner| Document { inner })
    }
}

impl fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.strong_count() > 0 {
            "WeakDocument"
        } else {
            "WeakDocument(dropped)"
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                body: Node::element("body"),
                config,
                focused: RefCell::new(WeakNode::default()),
                globals: RefCell::new(Map::new()),
                definitions: RefCell::new(IndexMap::new()),
                instances: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn body(&self) -> &Node {
        &self.inner.body
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Replace the body content with parsed `markup`.
    ///
    /// Parsing completes before the current content is touched.
    pub fn load(&self, markup: &str) -> Result<usize> {
        let nodes = parse_fragment(markup)?;
        for child in self.inner.body.children() {
            self.remove(&child);
        }
        let mut upgraded = 0;
        for node in nodes {
            upgraded += self.append(&self.inner.body, &node)?;
        }
        Ok(upgraded)
    }

    /// Append `child` to `parent`, upgrading defined elements if `parent` is
    /// connected. Returns how many elements were upgraded.
    pub fn append(&self, parent: &Node, child: &Node) -> Result<usize> {
        if child.parent().is_some() && self.is_connected(child) {
            self.release(child);
        }
        parent.append_child(child);
        self.adopt(child)
    }

    /// Detach `node`, unmounting every instance in its subtree first.
    pub fn remove(&self, node: &Node) {
        self.release(node);
        node.detach();
    }

    /// Whether `node` is attached under this document's body.
    pub fn is_connected(&self, node: &Node) -> bool {
        self.inner.body.contains(node)
    }

    /// Upgrade every defined, not yet upgraded element of a connected subtree.
    pub(crate) fn adopt(&self, node: &Node) -> Result<usize> {
        if !self.is_connected(node) {
            return Ok(0);
        }
        let mut upgraded = 0;
        for element in std::iter::once(node.clone()).chain(node.descendants()) {
            if self.upgrade(&element)? {
                upgraded += 1;
            }
        }
        Ok(upgraded)
    }

    /// Unmount every instance in a subtree. The nodes stay where they are.
    pub(crate) fn release(&self, node: &Node) {
        for element in std::iter::once(node.clone()).chain(node.descendants()) {
            let instance = self.inner.instances.borrow_mut().remove(&element.id());
            let Some(mut instance) = instance else {
                continue;
            };
            if let Some(callbacks) = self.callbacks_for(&element) {
                trace!(node = %element.id(), tag = element.tag_name(), "unmounting");
                (callbacks.unmount)(&element, instance.as_mut());
            }
        }
    }

    fn callbacks_for(&self, node: &Node) -> Option<Rc<ElementCallbacks>> {
        let tag = node.tag_name()?;
        self.inner.definitions.borrow().get(tag).cloned()
    }

    fn upgrade(&self, node: &Node) -> Result<bool> {
        let Some(callbacks) = self.callbacks_for(node) else {
            return Ok(false);
        };
        if self.inner.instances.borrow().contains_key(&node.id()) {
            return Ok(false);
        }

        let mut instance = (callbacks.construct)()?;
        (callbacks.mount)(self, node, instance.as_mut());
        trace!(node = %node.id(), tag = node.tag_name(), "mounted");

        self.inner.instances.borrow_mut().insert(node.id(), instance);
        Ok(true)
    }

    /// Register callbacks for `tag` and upgrade connected elements of it.
    ///
    /// A tag that is already defined is left alone and `Ok(0)` is returned.
    pub fn define(&self, tag: &str, callbacks: ElementCallbacks) -> Result<usize> {
        let tag = tag.to_ascii_lowercase();
        {
            let mut definitions = self.inner.definitions.borrow_mut();
            if definitions.contains_key(&tag) {
                debug!(tag = %tag, "element already defined");
                return Ok(0);
            }
            definitions.insert(tag.clone(), Rc::new(callbacks));
        }

        let mut upgraded = 0;
        for element in self.elements_by_tag(&tag) {
            if self.upgrade(&element)? {
                upgraded += 1;
            }
        }
        debug!(tag = %tag, upgraded, "defined element");
        Ok(upgraded)
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.inner
            .definitions
            .borrow()
            .contains_key(&tag.to_ascii_lowercase())
    }

    /// Whether `node` has been upgraded and is still mounted.
    pub fn is_upgraded(&self, node: &Node) -> bool {
        self.inner.instances.borrow().contains_key(&node.id())
    }

    pub fn instance_count(&self) -> usize {
        self.inner.instances.borrow().len()
    }

    /// Borrow the instance data of an upgraded element.
    ///
    /// `f` must not add or remove elements of this document.
    pub fn with_instance<T, R>(&self, node: &Node, f: impl FnOnce(&T) -> R) -> Option<R>
    where
        T: 'static,
    {
        let instances = self.inner.instances.borrow();
        let instance = instances.get(&node.id())?.downcast_ref::<T>()?;
        Some(f(instance))
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Focus a connected element. Returns `false` for anything else.
    pub fn focus(&self, node: &Node) -> bool {
        if !node.is_element() || !self.is_connected(node) {
            return false;
        }
        *self.inner.focused.borrow_mut() = node.downgrade();
        true
    }

    pub fn blur(&self) {
        *self.inner.focused.borrow_mut() = WeakNode::default();
    }

    /// The focused element, if it is still in the document.
    pub fn active_element(&self) -> Option<Node> {
        let focused = self.inner.focused.borrow().upgrade()?;
        if self.is_connected(&focused) {
            Some(focused)
        } else {
            self.blur();
            None
        }
    }

    // ------------------------------------------------------------------
    // Globals
    // ------------------------------------------------------------------

    pub fn set_global(&self, key: &str, value: Value) {
        self.inner.globals.borrow_mut().insert(key.to_string(), value);
    }

    pub fn global(&self, key: &str) -> Option<Value> {
        self.inner.globals.borrow().get(key).cloned()
    }

    /// Remove and return a global.
    pub fn take_global(&self, key: &str) -> Option<Value> {
        self.inner.globals.borrow_mut().remove(key)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn elements_by_tag(&self, tag: &str) -> Vec<Node> {
        self.inner
            .body
            .descendants()
            .into_iter()
            .filter(|node| node.has_tag(tag))
            .collect()
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Node>> {
        Ok(Selector::parse(selector)?.select_all(&self.inner.body))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<Node>> {
        self.inner.body.query_selector(selector)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("definitions", &self.inner.definitions.borrow().len())
            .field("instances", &self.inner.instances.borrow().len())
            .field("focused", &self.inner.focused.borrow())
            .finish()
    }
}
