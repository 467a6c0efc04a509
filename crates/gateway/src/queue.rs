//! Async queue - the pipeline's in-memory buffer
//!
//! An unbounded, insertion-order-preserving FIFO shared between intake
//! producers and the batch worker. `push` never blocks and never fails;
//! `try_pop` is non-blocking and returns `None` when empty rather than
//! waiting. `len` is advisory only - the worker uses it for drain-budget
//! math, never for correctness.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Thread-safe unbounded FIFO queue
///
/// # Design
///
/// - A `parking_lot::Mutex<VecDeque>` keeps the critical sections tiny;
///   nothing is held across an await
/// - FIFO order holds among successful pops; an item is returned by at
///   most one `try_pop` across all callers
/// - Lives for the process lifetime and is drained continuously
#[derive(Debug)]
pub struct AsyncQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> AsyncQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Append an item to the tail; never blocks, never fails
    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
    }

    /// Remove and return the head item, or `None` if the queue is empty
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Approximate current size
    ///
    /// Stale under concurrent mutation - advisory only.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True when the queue holds no items
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for AsyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
