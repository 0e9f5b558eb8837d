//! Host Document
//!
//! A single-threaded, in-memory stand-in for the browser DOM: nodes with
//! attributes and listeners, a document with focus and custom element
//! registration, markup parsing and serialization, and simple selectors.
//!
//! Everything here is `Rc`-based and `!Send`, like the main thread it
//! models.

mod document;
mod markup;
mod node;
mod selector;

pub use document::{Document, ElementCallbacks, WeakDocument};
pub use markup::{parse_element, parse_fragment, ParseError};
pub use node::{Event, ListenerId, Node, NodeId, WeakNode};
pub use selector::Selector;
