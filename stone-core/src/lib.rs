//! Stone Core
//!
//! This crate provides the runtime for Stone server-rendered components.
//! It implements:
//!
//! - Reactive primitives (signals, effects, per-component state)
//! - Rerender contexts that batch state changes into one patch per turn
//! - A tiered diff/patch engine for live markup trees
//! - Custom element glue with delegated events
//! - The server to client handoff of which components need hydration
//!
//! The client side runs against [`dom::Document`], an in-memory host
//! document, so the whole lifecycle can be driven and tested natively.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: signals, state, microtask scheduling and rerender contexts
//! - `patch`: tier selection, marked/in-place/structural patching, focus paths
//! - `dom`: host document, nodes, markup parsing and selectors
//! - `component`: definitions, element lifecycle and event delegation
//! - `registry`: render scopes, the handoff payload and hydration
//! - `config`, `logging`, `error`: ambient runtime concerns
//!
//! # Example
//!
//! ```rust,ignore
//! use stone_core::component::{create, ComponentOptions, StateSource};
//! use stone_core::registry::{initialize_components, load_page, ComponentRegistry, RenderScope};
//!
//! // Server
//! let counter = create("counter", ComponentOptions::new().state(StateSource::from_static(Count { count: 0 })));
//! let mut scope = RenderScope::new();
//! let body = counter.render(&mut scope, &Props::new(), ())?;
//! let page = scope.finish(&format!("<html><body>{body}</body></html>"));
//!
//! // Client
//! let document = Document::new();
//! load_page(&document, &page)?;
//! let mut registry = ComponentRegistry::new();
//! registry.register_definition(counter);
//! initialize_components(&document, &registry).await;
//! ```

pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod logging;
pub mod patch;
pub mod reactive;
pub mod registry;

pub use component::{create, create_from, ComponentDefinition, ComponentOptions, StateSource, TagName};
pub use config::RuntimeConfig;
pub use dom::Document;
pub use error::{Error, Result, RuntimeError};
pub use patch::{patch, PatchKind, PatchOptions, PatchResult};
pub use reactive::{run_microtasks, use_rerender, Signal, State};
pub use registry::{initialize_components, load_page, ComponentRegistry, RenderScope};
