//! Signal Implementation
//!
//! A Signal holds a value and a list of effects.
//!
//! # Batching
//!
//! Writes are committed immediately but notification is not. The first
//! committed write in a synchronous turn sets a pending flag and queues one
//! flush on the microtask queue; later writes in the same turn only replace
//! the value. When the flush runs, every effect sees the value current at
//! that moment, so intermediate values are never observed:
//!
//! ```rust,ignore
//! let count = Signal::new(0);
//! count.effect(|n| println!("count is {n}"));
//! for _ in 0..3 {
//!     count.update(|n| n + 1);
//! }
//! run_microtasks(); // prints "count is 3" once
//! ```
//!
//! # Lifecycle
//!
//! `stop()` and `unsubscribe()` go through the same queue as flushes. A flush
//! scheduled before the stop still reaches its effects; anything after is a
//! no-op. Signals are not reclaimed by subscribers going out of scope, so
//! owners must call `stop()` when they are done.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::effect::{Effect, SubscriberId};
use super::scheduler::queue_microtask;

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct SignalInner<T> {
    id: u64,
    value: RefCell<T>,
    effects: RefCell<Vec<Rc<Effect<T>>>>,
    /// Set while a flush is queued and not yet run.
    pending: Cell<bool>,
}

impl<T: Clone + 'static> SignalInner<T> {
    fn flush(&self) {
        self.pending.set(false);

        // Clone both out so effects may write to this signal or subscribe.
        let value = self.value.borrow().clone();
        let effects: Vec<_> = self.effects.borrow().clone();

        trace!(signal = self.id, effects = effects.len(), "flushing signal");
        for effect in effects {
            effect.run(&value);
        }
    }
}

/// A reactive cell.
///
/// Cloning a signal yields another handle to the same cell.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: next_signal_id(),
                value: RefCell::new(value),
                effects: RefCell::new(Vec::new()),
                pending: Cell::new(false),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Current value. Reading has no side effects.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Equal values are ignored; anything else schedules
    /// one batched notification.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.schedule_flush();
    }

    /// Compute the next value from the current one, then behave as [`set`](Self::set).
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.inner.value.borrow());
        self.set(next);
    }

    /// Subscribe `callback`. It runs after each committed change, not now.
    pub fn effect<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&T) + 'static,
    {
        let effect = Rc::new(Effect::new(callback));
        let id = effect.id();
        self.inner.effects.borrow_mut().push(effect);
        id
    }

    /// Remove one subscriber on the next microtask boundary.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let inner = Rc::clone(&self.inner);
        queue_microtask(move || {
            inner.effects.borrow_mut().retain(|effect| effect.id() != id);
        });
    }

    /// Remove every subscriber on the next microtask boundary.
    pub fn stop(&self) {
        let inner = Rc::clone(&self.inner);
        queue_microtask(move || {
            let dropped = std::mem::take(&mut *inner.effects.borrow_mut()).len();
            trace!(signal = inner.id, dropped, "signal stopped");
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.effects.borrow().len()
    }

    fn schedule_flush(&self) {
        if self.inner.pending.get() || self.inner.effects.borrow().is_empty() {
            return;
        }
        self.inner.pending.set(true);
        let inner = Rc::clone(&self.inner);
        queue_microtask(move || inner.flush());
    }
}

impl<T> fmt::Debug for Signal<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.effects.borrow().len())
            .finish()
    }
}

/// Type-erased view of a signal, for APIs that watch signals of mixed types.
pub trait Watch {
    fn signal_id(&self) -> u64;

    /// Subscribe a callback that ignores the value.
    fn watch(&self, notify: Rc<dyn Fn()>) -> SubscriberId;

    fn unwatch(&self, id: SubscriberId);

    fn stop(&self);

    /// Owned handle to the same signal.
    fn boxed(&self) -> Box<dyn Watch>;
}

impl<T> Watch for Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    fn signal_id(&self) -> u64 {
        self.id()
    }

    fn watch(&self, notify: Rc<dyn Fn()>) -> SubscriberId {
        self.effect(move |_| notify())
    }

    fn unwatch(&self, id: SubscriberId) {
        self.unsubscribe(id);
    }

    fn stop(&self) {
        Signal::stop(self);
    }

    fn boxed(&self) -> Box<dyn Watch> {
        Box::new(self.clone())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
