//! Reactive Primitives
//!
//! Signals, effects and the machinery that turns a committed state change
//! into exactly one patch of a component's live tree.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] holds a value and a list of [`Effect`]s. Writes commit at
//! once; notification is batched onto the microtask queue so effects observe
//! only the latest value of a turn.
//!
//! ## State
//!
//! A [`State`] is one signal per entry of a component's state record. The
//! server creates one per request; the client creates one per instance.
//!
//! ## Rerender contexts
//!
//! A [`RerenderContext`] binds a live root to its render function and state.
//! [`use_rerender`] subscribes it to signals; the context then re-renders and
//! patches at most once per turn.
//!
//! # Scheduling
//!
//! Nothing here runs on its own. The host drains [`run_microtasks`] at the end
//! of each task, which is where flushes and patch passes happen.

mod context;
mod effect;
mod rerender;
mod scheduler;
mod signal;
mod state;

pub use context::{use_context, ContextGuard, RerenderContext, WeakContext};
pub use effect::{Effect, SubscriberId};
pub use rerender::{use_rerender, use_rerender_with};
pub use scheduler::{pending_microtasks, queue_microtask, run_microtasks};
pub use signal::{Signal, Watch};
pub use state::State;
