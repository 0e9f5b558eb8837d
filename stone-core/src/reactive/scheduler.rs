//! Microtask Scheduler
//!
//! The "run on next turn" primitive the reactive system batches onto.
//!
//! Writes never notify synchronously. They enqueue a flush here, and the
//! host drains the queue once the current synchronous block is done. In a
//! browser that is the end of the task; here it is whoever calls
//! [`run_microtasks`] (the event loop, a test, a benchmark).
//!
//! The queue is thread-local. Everything that touches nodes is
//! single-threaded anyway.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::trace;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: RefCell<VecDeque<Task>> = RefCell::new(VecDeque::new());
    static DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Schedule `task` to run on the next drain.
pub fn queue_microtask<F>(task: F)
where
    F: FnOnce() + 'static,
{
    QUEUE.with(|queue| queue.borrow_mut().push_back(Box::new(task)));
}

/// Number of tasks waiting to run.
pub fn pending_microtasks() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

/// Resets the draining flag even if a task panics.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        DRAINING.with(|draining| draining.set(false));
    }
}

/// Run queued tasks in FIFO order until the queue is empty, including
/// tasks queued by the tasks themselves.
///
/// Returns how many tasks ran. A call made from inside a running task
/// returns `0` immediately; the outer drain picks up anything new.
pub fn run_microtasks() -> usize {
    if DRAINING.with(|draining| draining.replace(true)) {
        return 0;
    }
    let _guard = DrainGuard;

    let mut ran = 0;
    loop {
        // The borrow must end before the task runs; tasks enqueue.
        let next = QUEUE.with(|queue| queue.borrow_mut().pop_front());
        let Some(task) = next else {
            break;
        };
        task();
        ran += 1;
    }

    if ran > 0 {
        trace!(ran, "drained microtasks");
    }
    ran
}
