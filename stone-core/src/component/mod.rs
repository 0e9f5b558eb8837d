//! Components
//!
//! Everything needed to describe a component once and run it on both
//! sides: tag names, children and state sources, the definition itself,
//! the custom element glue and the event delegation hook.

mod children;
mod definition;
mod element;
mod events;
mod name;
mod state;

pub use children::Children;
pub use definition::{
    create, create_from, Cleanup, ClientFn, ComponentDefinition, ComponentOptions, Props, RenderFn,
};
pub use element::ComponentInstance;
pub use events::{use_events, EventBinding};
pub use name::TagName;
pub use state::{Record, StateSource};
