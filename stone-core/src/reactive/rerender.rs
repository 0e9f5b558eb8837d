//! Rerender Trigger
//!
//! `use_rerender` ties signals to the current [`RerenderContext`]: when any
//! of them commits a change, the context re-renders and patches its root.
//! Several signals changing in the same turn still yield one patch pass.

use std::rc::Rc;

use tracing::debug;

use super::context::RerenderContext;
use super::signal::Watch;
use crate::error::{Error, Result};

/// Re-render the current context whenever one of `signals` changes.
///
/// Fails with [`Error::NoActiveContext`] outside a client activation.
pub fn use_rerender(signals: &[&dyn Watch]) -> Result<()> {
    bind("use_rerender", signals).map(|_| ())
}

/// Like [`use_rerender`], and also run `after` once each patch pass is done.
///
/// `after` is where listeners bound directly to inner nodes get re-bound,
/// since a structural pass may have replaced those nodes.
pub fn use_rerender_with<F>(signals: &[&dyn Watch], after: F) -> Result<()>
where
    F: Fn() + 'static,
{
    let context = bind("use_rerender_with", signals)?;
    context.after_rerender(after);
    Ok(())
}

fn bind(hook: &'static str, signals: &[&dyn Watch]) -> Result<RerenderContext> {
    let context = RerenderContext::current().ok_or(Error::NoActiveContext { hook })?;

    for signal in signals {
        let weak = context.downgrade();
        let id = signal.watch(Rc::new(move || {
            if let Some(context) = weak.upgrade() {
                context.request_rerender();
            }
        }));

        let handle = signal.boxed();
        context.on_cleanup(move || handle.unwatch(id));
    }

    debug!(context = context.id(), signals = signals.len(), hook, "bound rerender");
    Ok(context)
}
