//! Rerender Context
//!
//! A [`RerenderContext`] binds one live root node to the render function and
//! state that produced it. Hooks such as
//! [`use_rerender`](super::use_rerender) find it through a thread-local
//! stack, the same way signals would find a tracking scope.
//!
//! # Batching
//!
//! Any number of rerender requests in one turn produce one patch pass. The
//! first request sets `patch_pending` and queues the pass; later ones see the
//! flag and return. The pass re-renders against the state as it is when the
//! pass runs.
//!
//! # Liveness
//!
//! [`teardown`](RerenderContext::teardown) marks the context dead and runs
//! its cleanups. A pass that was already queued sees the dead flag and does
//! nothing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error};

use super::scheduler::queue_microtask;
use super::state::State;
use crate::dom::Node;
use crate::error::{Error, Result};
use crate::patch::{self, PatchOptions, PatchResult};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<RerenderContext>> = const { RefCell::new(Vec::new()) };
}

static CONTEXT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

type Cleanup = Box<dyn FnOnce()>;

struct ContextInner {
    id: u64,
    root: Node,
    state: State,
    render: Box<dyn Fn() -> String>,
    options: PatchOptions,
    live: Cell<bool>,
    patch_pending: Cell<bool>,
    cleanups: RefCell<Vec<Cleanup>>,
    after_rerender: RefCell<Vec<Rc<dyn Fn()>>>,
    passes: Cell<usize>,
    last_result: RefCell<Option<PatchResult>>,
}

/// Live root + render function + state of one mounted component instance.
#[derive(Clone)]
pub struct RerenderContext {
    inner: Rc<ContextInner>,
}

/// Non-owning handle, held by signal effects so they do not keep a
/// torn-down context alive.
#[derive(Clone)]
pub struct WeakContext(Weak<ContextInner>);

impl WeakContext {
    pub fn upgrade(&self) -> Option<RerenderContext> {
        self.0.upgrade().map(|inner| RerenderContext { inner })
    }
}

impl RerenderContext {
    pub fn new<F>(root: Node, state: State, options: PatchOptions, render: F) -> Self
    where
        F: Fn() -> String + 'static,
    {
        Self {
            inner: Rc::new(ContextInner {
                id: CONTEXT_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
                root,
                state,
                render: Box::new(render),
                options,
                live: Cell::new(true),
                patch_pending: Cell::new(false),
                cleanups: RefCell::new(Vec::new()),
                after_rerender: RefCell::new(Vec::new()),
                passes: Cell::new(0),
                last_result: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn root(&self) -> &Node {
        &self.inner.root
    }

    pub fn state(&self) -> &State {
        &self.inner.state
    }

    pub fn options(&self) -> &PatchOptions {
        &self.inner.options
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.get()
    }

    pub fn downgrade(&self) -> WeakContext {
        WeakContext(Rc::downgrade(&self.inner))
    }

    /// Make this the current context until the guard drops.
    pub fn enter(&self) -> ContextGuard {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
        ContextGuard { id: self.inner.id }
    }

    /// Innermost entered context on this thread.
    pub fn current() -> Option<RerenderContext> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Register work to run on teardown.
    pub fn on_cleanup<F>(&self, cleanup: F)
    where
        F: FnOnce() + 'static,
    {
        if !self.is_live() {
            cleanup();
            return;
        }
        self.inner.cleanups.borrow_mut().push(Box::new(cleanup));
    }

    /// Register a callback run after every completed patch pass.
    pub fn after_rerender<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.inner.after_rerender.borrow_mut().push(Rc::new(callback));
    }

    /// Queue one patch pass for the next microtask boundary. Repeated
    /// requests before it runs are absorbed.
    pub fn request_rerender(&self) {
        if !self.is_live() || self.inner.patch_pending.replace(true) {
            return;
        }
        let weak = self.downgrade();
        queue_microtask(move || {
            if let Some(context) = weak.upgrade() {
                context.run_scheduled();
            }
        });
    }

    /// Re-render and patch right now.
    pub fn rerender(&self) -> Result<PatchResult> {
        let markup = (self.inner.render)();
        let result = patch::patch(&self.inner.root, &markup, &self.inner.options)?;

        self.inner.passes.set(self.inner.passes.get() + 1);
        *self.inner.last_result.borrow_mut() = Some(result.clone());

        let callbacks: Vec<_> = self.inner.after_rerender.borrow().clone();
        for callback in callbacks {
            callback();
        }
        Ok(result)
    }

    fn run_scheduled(&self) {
        self.inner.patch_pending.set(false);
        if !self.is_live() {
            debug!(context = self.inner.id, "skipping rerender of torn-down context");
            return;
        }
        match self.rerender() {
            Ok(result) => debug!(
                context = self.inner.id,
                kind = %result.kind,
                changes = result.changes,
                elapsed_us = result.duration.as_micros() as u64,
                "rerendered"
            ),
            Err(err) => error!(context = self.inner.id, error = %err, "rerender failed"),
        }
    }

    /// Completed patch passes.
    pub fn pass_count(&self) -> usize {
        self.inner.passes.get()
    }

    pub fn last_result(&self) -> Option<PatchResult> {
        self.inner.last_result.borrow().clone()
    }

    /// Mark the context dead and run every registered cleanup.
    pub fn teardown(&self) {
        if !self.inner.live.replace(false) {
            return;
        }
        let cleanups = std::mem::take(&mut *self.inner.cleanups.borrow_mut());
        debug!(context = self.inner.id, cleanups = cleanups.len(), "tearing down context");
        for cleanup in cleanups {
            cleanup();
        }
        self.inner.after_rerender.borrow_mut().clear();
    }
}

impl fmt::Debug for RerenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RerenderContext")
            .field("id", &self.inner.id)
            .field("root", &self.inner.root)
            .field("live", &self.inner.live.get())
            .field("passes", &self.inner.passes.get())
            .finish()
    }
}

/// Pops the context when dropped.
pub struct ContextGuard {
    id: u64,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            if let Some(context) = popped {
                debug_assert_eq!(
                    context.id(),
                    self.id,
                    "RerenderContext mismatch: expected {}, got {}",
                    self.id,
                    context.id()
                );
            }
        });
    }
}

/// The current context, or [`Error::NoActiveContext`].
pub fn use_context() -> Result<RerenderContext> {
    RerenderContext::current().ok_or(Error::NoActiveContext { hook: "use_context" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::run_microtasks;
    use serde_json::json;

    fn counter_context() -> RerenderContext {
        let root = crate::dom::parse_element("<div><span data-watch>0</span></div>").unwrap();
        let serde_json::Value::Object(record) = json!({ "count": 0 }) else {
            unreachable!()
        };
        let state = State::from_record(record);
        let render_state = state.clone();
        RerenderContext::new(root, state, PatchOptions::default(), move || {
            let count = render_state.get_as::<i64>("count").unwrap_or_default();
            format!("<div><span data-watch>{count}</span></div>")
        })
    }

    #[test]
    fn context_stack_tracks_entered_context() {
        let context = counter_context();
        assert!(RerenderContext::current().is_none());
        {
            let _guard = context.enter();
            assert_eq!(RerenderContext::current().map(|c| c.id()), Some(context.id()));
        }
        assert!(RerenderContext::current().is_none());
    }

    #[test]
    fn nested_contexts_restore_outer() {
        let outer = counter_context();
        let inner = counter_context();
        let _outer_guard = outer.enter();
        {
            let _inner_guard = inner.enter();
            assert_eq!(use_context().unwrap().id(), inner.id());
        }
        assert_eq!(use_context().unwrap().id(), outer.id());
    }

    #[test]
    fn use_context_outside_is_an_error() {
        assert!(matches!(
            use_context(),
            Err(Error::NoActiveContext { hook: "use_context" })
        ));
    }

    #[test]
    fn requests_in_one_turn_share_one_pass() {
        let context = counter_context();
        context.state().set("count", 1);
        context.request_rerender();
        context.request_rerender();
        context.request_rerender();

        assert_eq!(run_microtasks(), 1);
        assert_eq!(context.pass_count(), 1);
        assert_eq!(context.root().text_content(), "1");
    }

    #[test]
    fn teardown_runs_cleanups_and_cancels_pending_pass() {
        let context = counter_context();
        let cleaned = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let cleaned = cleaned.clone();
            context.on_cleanup(move || cleaned.set(cleaned.get() + 1));
        }

        context.request_rerender();
        context.teardown();
        context.teardown();
        run_microtasks();

        assert_eq!(cleaned.get(), 2);
        assert_eq!(context.pass_count(), 0);
        assert!(!context.is_live());
    }

    #[test]
    fn after_rerender_runs_after_each_pass() {
        let context = counter_context();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        context.after_rerender(move || seen.set(seen.get() + 1));

        context.state().set("count", 7);
        let result = context.rerender().unwrap();
        assert_eq!(result.changes, 1);
        assert_eq!(calls.get(), 1);
    }
}
