//! Component Definition
//!
//! A [`ComponentDefinition`] is written once and used on both sides:
//!
//! - on the server, [`render`](ComponentDefinition::render) produces markup
//!   and records the component in the request's [`RenderScope`];
//! - on the client, [`module`](ComponentDefinition::module) registers the
//!   custom element so that live elements get their own state and client
//!   activation.
//!
//! Definitions are `Send + Sync` so a server can keep them in a static or
//! share them across request tasks. Anything request-specific lives in the
//! `RenderScope`.
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Serialize)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let counter = create(
//!     "counter",
//!     ComponentOptions::new()
//!         .state(StateSource::from_static(Counter { count: 0 }))
//!         .render(|state, _props, _children| {
//!             let count = state.get_as::<i64>("count").unwrap_or_default();
//!             format!("<span data-watch>{count}</span><button>+</button>")
//!         }),
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use super::children::Children;
use super::element::element_callbacks;
use super::name::TagName;
use super::state::StateSource;
use crate::dom::{Document, Node};
use crate::error::Result;
use crate::reactive::State;
use crate::registry::RenderScope;

/// Props passed to a component call.
pub type Props = Map<String, Value>;

/// Cleanup returned by a client activation.
pub type Cleanup = Box<dyn FnOnce()>;

pub type RenderFn = Arc<dyn Fn(&State, &Props, &str) -> String + Send + Sync>;

pub type ClientFn = Arc<dyn Fn(&Node, &State) -> Option<Cleanup> + Send + Sync>;

/// Name used by [`create_from`] when the options carry none.
const FALLBACK_NAME: &str = "s-component";

/// Builder for a definition.
#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub name: Option<String>,
    pub state: StateSource,
    pub render: Option<RenderFn>,
    pub client: Option<ClientFn>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn state(mut self, state: StateSource) -> Self {
        self.state = state;
        self
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&State, &Props, &str) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Activation run inside the element's rerender context on mount.
    pub fn client<F>(mut self, client: F) -> Self
    where
        F: Fn(&Node, &State) -> Option<Cleanup> + Send + Sync + 'static,
    {
        self.client = Some(Arc::new(client));
        self
    }
}

impl fmt::Debug for ComponentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("render", &self.render.is_some())
            .field("client", &self.client.is_some())
            .finish()
    }
}

struct DefinitionInner {
    name: TagName,
    state: StateSource,
    render: Option<RenderFn>,
    client: Option<ClientFn>,
}

/// A named component: render function, state source and optional client
/// activation. Cloning is cheap.
#[derive(Clone)]
pub struct ComponentDefinition {
    inner: Arc<DefinitionInner>,
}

/// Define a component. `name` is normalized, see [`TagName::normalize`].
pub fn create(name: &str, options: ComponentOptions) -> ComponentDefinition {
    ComponentDefinition {
        inner: Arc::new(DefinitionInner {
            name: TagName::normalize(name),
            state: options.state,
            render: options.render,
            client: options.client,
        }),
    }
}

/// Define a component whose name comes from the options.
pub fn create_from(options: ComponentOptions) -> ComponentDefinition {
    let name = options.name.clone().unwrap_or_else(|| FALLBACK_NAME.to_string());
    create(&name, options)
}

impl ComponentDefinition {
    pub fn name(&self) -> &TagName {
        &self.inner.name
    }

    pub fn has_client(&self) -> bool {
        self.inner.client.is_some()
    }

    pub(crate) fn client(&self) -> Option<&ClientFn> {
        self.inner.client.as_ref()
    }

    /// Server render: record the component in `scope`, then render against
    /// the scope's state for this component.
    pub fn render(
        &self,
        scope: &mut RenderScope,
        props: &Props,
        children: impl Into<Children>,
    ) -> Result<String> {
        scope.mark(&self.inner.name);
        let state = scope.state_for(self)?;
        let children = children.into().normalize();
        trace!(tag = %self.inner.name, "server render");
        Ok(self.render_markup(&state, props, &children))
    }

    /// Same as [`render`](Self::render).
    pub fn ssr(
        &self,
        scope: &mut RenderScope,
        props: &Props,
        children: impl Into<Children>,
    ) -> Result<String> {
        self.render(scope, props, children)
    }

    /// Run the render function against `state` and wrap the result in the
    /// component's tag.
    pub fn render_markup(&self, state: &State, props: &Props, children: &str) -> String {
        let body = match &self.inner.render {
            Some(render) => render(state, props, children),
            None => children.to_string(),
        };
        self.inner.name.wrap(&body)
    }

    /// Fresh, unshared signals for one scope or instance.
    pub fn instantiate_state(&self) -> Result<State> {
        self.inner.state.instantiate(self.inner.name.as_str())
    }

    /// Register the custom element with `document`. Repeat calls are no-ops.
    ///
    /// Returns how many already connected elements were upgraded.
    pub fn module(&self, document: &Document) -> Result<usize> {
        if document.is_defined(self.inner.name.as_str()) {
            return Ok(0);
        }
        document.define(self.inner.name.as_str(), element_callbacks(self.clone()))
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.inner.name)
            .field("state", &self.inner.state)
            .field("client", &self.inner.client.is_some())
            .finish()
    }
}
