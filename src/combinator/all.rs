//! All combinator: wait for every input to fulfill.
//!
//! # Semantics
//!
//! `all(sources)`:
//! 1. Adopt every source into a fresh promise
//! 2. Store each fulfillment at its input index
//! 3. Fulfill with the ordered values once every source has fulfilled
//!
//! The first rejection rejects the aggregate immediately; later outcomes are
//! discarded. An empty input fulfills with an empty vector in the same call.
//!
//! Result order follows input order, never completion order.

use crate::promise::{Promise, Resolution};
use crate::runtime::SchedulerHandle;
use crate::tracing_compat::{debug, trace};
use crate::types::Settled;
use std::cell::RefCell;
use std::rc::Rc;

/// Bookkeeping for an in-flight `all`.
///
/// Values are slotted by input index. Once the tracker is marked settled
/// (completion or first rejection), further records are ignored.
#[derive(Debug)]
pub struct AllTracker<T> {
    values: Vec<Option<T>>,
    resolved_count: usize,
    settled: bool,
}

impl<T> AllTracker<T> {
    /// Creates a tracker for `total` inputs.
    #[must_use]
    pub fn new(total: usize) -> Self {
        let mut values = Vec::with_capacity(total);
        values.resize_with(total, || None);
        Self {
            values,
            resolved_count: 0,
            settled: false,
        }
    }

    /// Number of inputs.
    #[must_use]
    pub fn total(&self) -> usize {
        self.values.len()
    }

    /// Number of recorded fulfillments.
    #[must_use]
    pub const fn resolved_count(&self) -> usize {
        self.resolved_count
    }

    /// True once the aggregate outcome has been decided.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }

    /// Stops accepting records.
    pub fn mark_settled(&mut self) {
        self.settled = true;
    }

    /// Stores the fulfillment of input `index`.
    ///
    /// Returns true when this record completed the set. Records after
    /// settlement, duplicate indices and out-of-range indices are ignored.
    pub fn record_fulfillment(&mut self, index: usize, value: T) -> bool {
        if self.settled {
            return false;
        }
        let Some(slot) = self.values.get_mut(index) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        self.resolved_count += 1;
        if self.resolved_count == self.values.len() {
            self.settled = true;
            true
        } else {
            false
        }
    }

    /// Records a rejection. Returns true if it is the one that decides the
    /// aggregate.
    pub fn record_rejection(&mut self) -> bool {
        if self.settled {
            return false;
        }
        self.settled = true;
        true
    }

    /// Takes the ordered values. Only meaningful after completion.
    pub fn collect_values(&mut self) -> Vec<T> {
        std::mem::take(&mut self.values)
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Waits for every source to fulfill, preserving input order.
///
/// ```
/// use xpromise::{all, JobQueue, Promise, Resolution};
///
/// let queue = JobQueue::new();
/// let sched = queue.handle();
/// let sources: Vec<Resolution<i32, String>> = vec![
///     Promise::resolve(&sched, 1).into(),
///     Resolution::Value(2),
///     Promise::resolve(&sched, 3).into(),
/// ];
/// let combined = all(&sched, sources);
/// queue.run_pending();
/// assert_eq!(combined.value(), Some(vec![1, 2, 3]));
/// ```
pub fn all<T, E, I>(scheduler: &SchedulerHandle, sources: I) -> Promise<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Resolution<T, E>>,
{
    let sources: Vec<Resolution<T, E>> = sources.into_iter().collect();
    let (aggregate, resolve, reject) = Promise::with_resolvers(scheduler);
    if sources.is_empty() {
        trace!("all over empty input; fulfilling immediately");
        resolve.resolve(Vec::new());
        return aggregate;
    }

    let tracker = Rc::new(RefCell::new(AllTracker::new(sources.len())));
    for (index, source) in sources.into_iter().enumerate() {
        let tracker = Rc::clone(&tracker);
        let resolve = resolve.clone();
        let reject = reject.clone();
        Promise::resolve_with(scheduler, source).observe(move |settled| match settled {
            Settled::Fulfilled(value) => {
                let complete = tracker.borrow_mut().record_fulfillment(index, value);
                if complete {
                    let values = tracker.borrow_mut().collect_values();
                    resolve.resolve(values);
                }
            }
            Settled::Rejected(reason) => {
                let decisive = tracker.borrow_mut().record_rejection();
                if decisive {
                    reject.reject(reason);
                } else {
                    debug!(index, "late rejection in all discarded");
                }
            }
        });
    }
    aggregate
}
