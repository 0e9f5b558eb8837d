//! Effects
//!
//! An [`Effect`] is a callback subscribed to one signal. It is not run on
//! registration; the signal runs it after each committed change with the
//! value current at flush time.
//!
//! Every subscription is identified by a [`SubscriberId`], which is also the
//! handle used to unsubscribe.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// IDs come from a process-wide counter, so an ID returned by one signal
/// never collides with one returned by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// A callback invoked with a signal's value after it changes.
pub struct Effect<T> {
    id: SubscriberId,
    callback: Box<dyn Fn(&T)>,
    runs: Cell<usize>,
}

impl<T> Effect<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self {
            id: SubscriberId::new(),
            callback: Box::new(callback),
            runs: Cell::new(0),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Invoke the callback with `value`.
    pub fn run(&self, value: &T) {
        self.runs.set(self.runs.get() + 1);
        (self.callback)(value);
    }

    /// How many times the effect has fired.
    pub fn run_count(&self) -> usize {
        self.runs.get()
    }
}

impl<T> fmt::Debug for Effect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("runs", &self.runs.get())
            .finish()
    }
}
