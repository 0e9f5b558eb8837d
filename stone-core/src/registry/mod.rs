//! Registration Bridge
//!
//! Server to client handoff of which components a page needs.
//!
//! - Server: components record themselves in the request's [`RenderScope`]
//!   while rendering; [`RenderScope::finish`] embeds the names in the page.
//! - Client: [`load_page`] puts the page into a [`Document`](crate::dom::Document)
//!   and [`initialize_components`] loads and initializes exactly the listed
//!   components through a [`ComponentRegistry`].

mod bridge;
mod payload;
mod scope;

pub use bridge::{
    initialize_components, load_page, ComponentModule, ComponentRegistry, HydrationReport,
    ModuleFuture,
};
pub use payload::HandoffPayload;
pub use scope::RenderScope;
