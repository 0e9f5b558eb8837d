//! Event delegation.
//!
//! [`use_events`] attaches one listener per binding to the component root.
//! When an event reaches the root, the nearest ancestor-or-self of the
//! target that matches the binding's selector (without leaving the root)
//! receives the handler call. Because the listener sits on the root, it
//! survives every patch tier, including structural passes that replace the
//! inner nodes.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::dom::{Event, Node, Selector};
use crate::error::{Error, Result};
use crate::reactive::RerenderContext;

type Handler = Rc<dyn Fn(&Event, &Node)>;

/// A (selector, event type, handler) triple.
#[derive(Clone)]
pub struct EventBinding {
    selector: Selector,
    event_type: String,
    handler: Handler,
}

impl EventBinding {
    pub fn new<F>(event_type: &str, selector: &str, handler: F) -> Result<Self>
    where
        F: Fn(&Event, &Node) + 'static,
    {
        Ok(Self {
            selector: Selector::parse(selector)?,
            event_type: event_type.to_string(),
            handler: Rc::new(handler),
        })
    }

    pub fn click<F>(selector: &str, handler: F) -> Result<Self>
    where
        F: Fn(&Event, &Node) + 'static,
    {
        Self::new("click", selector, handler)
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("event_type", &self.event_type)
            .field("selector", &self.selector.as_str())
            .finish()
    }
}

/// Attach delegated listeners to the current context's root.
///
/// The listeners are removed when the context is torn down. Returns how
/// many were attached.
pub fn use_events(bindings: Vec<EventBinding>) -> Result<usize> {
    let context = RerenderContext::current().ok_or(Error::NoActiveContext { hook: "use_events" })?;
    let root = context.root().clone();
    let mut attached = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let weak_root = root.downgrade();
        let event_type = binding.event_type.clone();
        let id = root
            .add_event_listener(&event_type, move |event| {
                let Some(root) = weak_root.upgrade() else {
                    return;
                };
                if let Some(matched) = binding.selector.closest(event.target(), Some(&root)) {
                    trace!(event = %event.event_type(), selector = %binding.selector, "delegated event");
                    (binding.handler)(event, &matched);
                }
            })
            .ok_or(Error::NotAnElement(root.id().raw()))?;
        attached.push(id);
    }

    let count = attached.len();
    let weak_root = root.downgrade();
    context.on_cleanup(move || {
        if let Some(root) = weak_root.upgrade() {
            for id in attached {
                root.remove_event_listener(id);
            }
        }
    });
    Ok(count)
}
