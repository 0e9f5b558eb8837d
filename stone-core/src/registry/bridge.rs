//! Client side of the registration bridge.
//!
//! The page carries the names of the components it needs; the
//! [`ComponentRegistry`] maps names to lazy loaders. Hydration loads exactly
//! the listed components and nothing else.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use super::payload::HandoffPayload;
use crate::component::ComponentDefinition;
use crate::dom::{parse_fragment, Document, Node};
use crate::error::Result;

/// What a loader resolves to: a module that may expose an initializer.
#[derive(Clone, Default)]
pub struct ComponentModule {
    initializer: Option<ComponentDefinition>,
}

impl ComponentModule {
    pub fn new(definition: ComponentDefinition) -> Self {
        Self {
            initializer: Some(definition),
        }
    }

    /// A module without an initializer.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn initializer(&self) -> Option<&ComponentDefinition> {
        self.initializer.as_ref()
    }
}

impl From<ComponentDefinition> for ComponentModule {
    fn from(definition: ComponentDefinition) -> Self {
        Self::new(definition)
    }
}

pub type ModuleFuture = LocalBoxFuture<'static, Result<ComponentModule>>;

type Loader = Rc<dyn Fn() -> ModuleFuture>;

/// Name to lazy loader.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    loaders: IndexMap<String, Loader>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader under `name`. A later registration for the same name
    /// replaces the earlier one.
    pub fn register<F, Fut>(&mut self, name: &str, loader: F) -> &mut Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<ComponentModule>> + 'static,
    {
        self.loaders
            .insert(name.to_string(), Rc::new(move || loader().boxed_local()));
        self
    }

    /// Register a definition that is already in memory.
    pub fn register_definition(&mut self, definition: ComponentDefinition) -> &mut Self {
        let name = definition.name().as_str().to_string();
        self.register(&name, move || {
            let module = ComponentModule::new(definition.clone());
            async move { Ok(module) }
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    fn loader(&self, name: &str) -> Option<Loader> {
        self.loaders.get(name).cloned()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.loaders.keys()).finish()
    }
}

/// Outcome of [`initialize_components`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Components whose initializer ran.
    pub activated: Vec<String>,
    /// Names in the payload without a loader.
    pub missing: Vec<String>,
    /// Names whose loader or initializer failed, with the reason.
    pub failed: Vec<(String, String)>,
    /// Elements upgraded by the initializers.
    pub upgraded: usize,
}

impl HydrationReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

/// Read the payload from `document` and run the initializer of every listed
/// component, in payload order.
///
/// Missing loaders and failing loaders are logged and reported, never
/// returned as errors: the rest of the page still hydrates.
pub async fn initialize_components(document: &Document, registry: &ComponentRegistry) -> HydrationReport {
    let global = document.config().payload_global.clone();
    let mut report = HydrationReport::default();

    let Some(payload) = HandoffPayload::take(document, &global) else {
        debug!(global = %global, "no registration payload, nothing to hydrate");
        return report;
    };
    info!(components = payload.names().len(), "hydrating");

    for name in payload.names() {
        let Some(loader) = registry.loader(name) else {
            warn!(tag = %name, "no loader registered for component, skipping");
            report.missing.push(name.clone());
            continue;
        };

        let module = match loader().await {
            Ok(module) => module,
            Err(err) => {
                error!(tag = %name, error = %err, "component module failed to load");
                report.failed.push((name.clone(), err.to_string()));
                continue;
            }
        };

        let Some(definition) = module.initializer() else {
            debug!(tag = %name, "module has no initializer");
            continue;
        };
        match definition.module(document) {
            Ok(upgraded) => {
                report.activated.push(name.clone());
                report.upgraded += upgraded;
            }
            Err(err) => {
                error!(tag = %name, error = %err, "component initializer failed");
                report.failed.push((name.clone(), err.to_string()));
            }
        }
    }

    info!(
        activated = report.activated.len(),
        missing = report.missing.len(),
        failed = report.failed.len(),
        upgraded = report.upgraded,
        "hydration finished"
    );
    report
}

/// Load a server-rendered page into `document`: the body content becomes the
/// document body and the inline payload is installed into the reserved
/// global, as evaluating the page's script would.
pub fn load_page(document: &Document, html: &str) -> Result<Option<HandoffPayload>> {
    let global = document.config().payload_global.clone();
    let payload = HandoffPayload::extract(html, &global);

    let top = parse_fragment(html)?;
    let content = page_content(top);

    for child in document.body().children() {
        document.remove(&child);
    }
    for node in content {
        document.append(document.body(), &node)?;
    }

    match &payload {
        Some(payload) => payload.install(document, &global),
        None => debug!(global = %global, "page carries no registration payload"),
    }
    Ok(payload)
}

/// Children of `<body>` when the page has one, otherwise the fragment
/// itself. Inline scripts are left out.
fn page_content(top: Vec<Node>) -> Vec<Node> {
    let body = top.iter().find_map(|node| {
        if node.has_tag("body") {
            Some(node.clone())
        } else {
            node.descendants().into_iter().find(|n| n.has_tag("body"))
        }
    });
    let nodes = match body {
        Some(body) => body.children(),
        None => top,
    };
    nodes.into_iter().filter(|node| !node.has_tag("script")).collect()
}
