//! Custom element glue.
//!
//! Turns a [`ComponentDefinition`] into the three callbacks that
//! [`Document::define`] expects. Each upgraded element owns a
//! [`ComponentInstance`]: its own signals, its rerender context and the
//! cleanup returned by the client activation.

use std::any::Any;

use tracing::{debug, warn};

use super::definition::{Cleanup, ComponentDefinition, Props};
use crate::dom::{Document, ElementCallbacks, Node};
use crate::patch::PatchOptions;
use crate::reactive::{RerenderContext, State};

/// Per-element data of a mounted component.
pub struct ComponentInstance {
    state: State,
    context: Option<RerenderContext>,
    user_cleanup: Option<Cleanup>,
}

impl ComponentInstance {
    fn new(state: State) -> Self {
        Self {
            state,
            context: None,
            user_cleanup: None,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn context(&self) -> Option<&RerenderContext> {
        self.context.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.context.as_ref().is_some_and(RerenderContext::is_live)
    }

    fn mount(&mut self, definition: &ComponentDefinition, document: &Document, node: &Node) {
        let render_state = self.state.clone();
        let render_definition = definition.clone();
        let context = RerenderContext::new(
            node.clone(),
            self.state.clone(),
            PatchOptions::from_document(document),
            move || render_definition.render_markup(&render_state, &Props::new(), ""),
        );

        let stop_state = self.state.clone();
        context.on_cleanup(move || stop_state.stop_all());

        if let Some(client) = definition.client() {
            let _guard = context.enter();
            self.user_cleanup = client(node, &self.state);
        }

        debug!(tag = %definition.name(), node = %node.id(), "component mounted");
        self.context = Some(context);
    }

    fn unmount(&mut self) {
        if let Some(context) = self.context.take() {
            context.teardown();
        }
        if let Some(cleanup) = self.user_cleanup.take() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("state", &self.state)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

pub(crate) fn element_callbacks(definition: ComponentDefinition) -> ElementCallbacks {
    let construct_definition = definition.clone();
    let mount_definition = definition;

    ElementCallbacks::new(
        move || {
            let state = construct_definition.instantiate_state()?;
            Ok(Box::new(ComponentInstance::new(state)) as Box<dyn Any>)
        },
        move |document, node, instance| match instance.downcast_mut::<ComponentInstance>() {
            Some(instance) => instance.mount(&mount_definition, document, node),
            None => warn!(node = %node.id(), "instance data is not a component instance"),
        },
        |node, instance| match instance.downcast_mut::<ComponentInstance>() {
            Some(instance) => {
                instance.unmount();
                debug!(node = %node.id(), "component unmounted");
            }
            None => warn!(node = %node.id(), "instance data is not a component instance"),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{create, ComponentOptions, StateSource};
    use crate::reactive::{run_microtasks, use_rerender};
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Count {
        count: i64,
    }

    fn counter(cleanups: Arc<AtomicUsize>) -> ComponentDefinition {
        create(
            "counter",
            ComponentOptions::new()
                .state(StateSource::from_static(Count { count: 0 }))
                .render(|state, _, _| {
                    let count = state.get_as::<i64>("count").unwrap_or_default();
                    format!("<span data-watch>{count}</span><button>+</button>")
                })
                .client(move |_node, state| {
                    let signals = state.watchers();
                    use_rerender(&signals).ok()?;
                    let cleanups = cleanups.clone();
                    Some(Box::new(move || {
                        cleanups.fetch_add(1, Ordering::SeqCst);
                    }) as Cleanup)
                }),
        )
    }

    #[test]
    fn each_element_gets_its_own_state() {
        let document = Document::new();
        document
            .load("<s-counter><span data-watch>0</span><button>+</button></s-counter><s-counter><span data-watch>0</span><button>+</button></s-counter>")
            .unwrap();
        let definition = counter(Arc::new(AtomicUsize::new(0)));
        assert_eq!(definition.module(&document).unwrap(), 2);

        let elements = document.elements_by_tag("s-counter");
        let first = document
            .with_instance(&elements[0], |i: &ComponentInstance| i.state().clone())
            .unwrap();
        first.set("count", 5);
        run_microtasks();

        assert_eq!(elements[0].text_content(), "5+");
        assert_eq!(elements[1].text_content(), "0+");
    }

    #[test]
    fn unmount_runs_every_cleanup() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let document = Document::new();
        document.load("<s-counter><span data-watch>0</span><button>+</button></s-counter>").unwrap();
        counter(cleanups.clone()).module(&document).unwrap();

        let element = document.elements_by_tag("s-counter").remove(0);
        let state = document
            .with_instance(&element, |i: &ComponentInstance| i.state().clone())
            .unwrap();
        assert!(state.signal("count").unwrap().subscriber_count() > 0);

        document.remove(&element);
        run_microtasks();

        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(state.signal("count").unwrap().subscriber_count(), 0);

        // Writes after unmount touch nothing.
        state.set("count", 9);
        run_microtasks();
        assert_eq!(element.text_content(), "0+");
    }

    #[test]
    fn module_is_idempotent() {
        let document = Document::new();
        let definition = counter(Arc::new(AtomicUsize::new(0)));
        assert_eq!(definition.module(&document).unwrap(), 0);
        document.load("<s-counter></s-counter>").unwrap();
        assert_eq!(definition.module(&document).unwrap(), 0);
        assert_eq!(document.instance_count(), 1);
    }
}
