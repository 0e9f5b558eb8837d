//! Error types.
//!
//! Everything fallible in the crate returns [`Error`]. Signal operations are
//! deliberately absent: writes, subscriptions and `stop()` never fail.

use thiserror::Error;

use crate::dom::ParseError;

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum Error {
    /// A hook that needs a [`RerenderContext`](crate::reactive::RerenderContext)
    /// was called outside a component's client activation.
    #[error("no active context: `{hook}` must be called inside a component's client activation")]
    NoActiveContext { hook: &'static str },

    /// Per-instance state could not be produced, so the instance cannot be
    /// isolated from its siblings.
    #[error("cannot create isolated state for <{component}> from `{shape}`: {reason}")]
    StateClone {
        component: String,
        shape: String,
        reason: String,
    },

    /// Candidate markup could not be parsed. No node was mutated.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A lazily loaded component module failed to resolve.
    #[error("failed to load module for <{name}>: {reason}")]
    ModuleLoad { name: String, reason: String },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// An element operation was attempted on a text node.
    #[error("node {0} is not an element")]
    NotAnElement(u64),
}

/// Alias kept for call sites that read better with the runtime in the name.
pub type RuntimeError = Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
