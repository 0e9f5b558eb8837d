//! Render scope.
//!
//! One [`RenderScope`] per server request. It collects the names of the
//! components rendered for the page and owns the request's SSR state, so
//! concurrent requests never share signals.

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::debug;

use super::payload::HandoffPayload;
use crate::component::{ComponentDefinition, TagName};
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::reactive::State;

#[derive(Debug, Default)]
pub struct RenderScope {
    names: IndexSet<String>,
    states: HashMap<String, State>,
    config: RuntimeConfig,
}

impl RenderScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Record that `name` was rendered. First occurrence wins the position.
    pub fn mark(&mut self, name: &TagName) {
        if self.names.insert(name.as_str().to_string()) {
            debug!(tag = %name, "registered component for hydration");
        }
    }

    /// The request's state for `definition`, created on first use.
    pub fn state_for(&mut self, definition: &ComponentDefinition) -> Result<State> {
        let name = definition.name().as_str();
        if let Some(state) = self.states.get(name) {
            return Ok(state.clone());
        }
        let state = definition.instantiate_state()?;
        self.states.insert(name.to_string(), state.clone());
        Ok(state)
    }

    /// SSR state of a component rendered in this scope.
    pub fn state_of(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Names in first-render order.
    pub fn component_names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn payload(&self) -> HandoffPayload {
        HandoffPayload::new(self.component_names())
    }

    /// Add the initialization script to a rendered page, before `</body>`
    /// when there is one.
    pub fn finish(&self, page: &str) -> String {
        let script = self.payload().to_script(&self.config.payload_global);
        match page.rfind("</body>") {
            Some(index) => {
                let mut out = String::with_capacity(page.len() + script.len());
                out.push_str(&page[..index]);
                out.push_str(&script);
                out.push_str(&page[index..]);
                out
            }
            None => format!("{page}{script}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{create, ComponentOptions, Props};

    #[test]
    fn names_are_unique_and_ordered() {
        let mut scope = RenderScope::new();
        let gauge = create("gauge", ComponentOptions::new());
        let counter = create("counter", ComponentOptions::new());

        gauge.render(&mut scope, &Props::new(), ()).unwrap();
        counter.render(&mut scope, &Props::new(), ()).unwrap();
        gauge.render(&mut scope, &Props::new(), ()).unwrap();

        assert_eq!(scope.component_names(), vec!["s-gauge", "s-counter"]);
    }

    #[test]
    fn finish_inserts_before_body_end() {
        let mut scope = RenderScope::new();
        scope.mark(&TagName::normalize("counter"));

        let page = scope.finish("<html><body><main></main></body></html>");
        assert_eq!(
            page,
            r#"<html><body><main></main><script type="module">window.__STONE__ = {"componentsToRegister":["s-counter"]};</script></body></html>"#
        );

        let fragment = scope.finish("<main></main>");
        assert!(fragment.starts_with("<main></main><script"));
    }

    #[test]
    fn empty_scope_still_emits_payload() {
        let scope = RenderScope::new();
        assert!(scope.finish("").contains(r#"{"componentsToRegister":[]}"#));
    }
}
