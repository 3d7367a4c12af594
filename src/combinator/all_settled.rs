//! All-settled combinator: wait for every input to settle either way.
//!
//! Never rejects. Fulfills with one [`Settled`] per input, in input order,
//! once the last input settles. An empty input fulfills immediately.

use crate::promise::{Promise, Resolution};
use crate::runtime::SchedulerHandle;
use crate::tracing_compat::trace;
use crate::types::Settled;
use std::cell::RefCell;
use std::rc::Rc;

/// Bookkeeping for an in-flight `all_settled`.
#[derive(Debug)]
pub struct AllSettledTracker<T, E> {
    outcomes: Vec<Option<Settled<T, E>>>,
    settled_count: usize,
}

impl<T, E> AllSettledTracker<T, E> {
    /// Creates a tracker for `total` inputs.
    #[must_use]
    pub fn new(total: usize) -> Self {
        let mut outcomes = Vec::with_capacity(total);
        outcomes.resize_with(total, || None);
        Self {
            outcomes,
            settled_count: 0,
        }
    }

    /// Number of inputs that have settled.
    #[must_use]
    pub const fn settled_count(&self) -> usize {
        self.settled_count
    }

    /// Stores the outcome of input `index`. Returns true when the set is
    /// complete.
    pub fn record(&mut self, index: usize, outcome: Settled<T, E>) -> bool {
        let Some(slot) = self.outcomes.get_mut(index) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        self.settled_count += 1;
        self.settled_count == self.outcomes.len()
    }

    /// Takes the ordered outcomes.
    pub fn collect_outcomes(&mut self) -> Vec<Settled<T, E>> {
        std::mem::take(&mut self.outcomes)
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Waits for every source to settle and reports each outcome.
pub fn all_settled<T, E, I>(
    scheduler: &SchedulerHandle,
    sources: I,
) -> Promise<Vec<Settled<T, E>>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Resolution<T, E>>,
{
    let sources: Vec<Resolution<T, E>> = sources.into_iter().collect();
    let (aggregate, resolve, _reject) = Promise::with_resolvers(scheduler);
    if sources.is_empty() {
        trace!("all_settled over empty input; fulfilling immediately");
        resolve.resolve(Vec::new());
        return aggregate;
    }

    let tracker = Rc::new(RefCell::new(AllSettledTracker::new(sources.len())));
    for (index, source) in sources.into_iter().enumerate() {
        let tracker = Rc::clone(&tracker);
        let resolve = resolve.clone();
        Promise::resolve_with(scheduler, source).observe(move |settled| {
            let complete = tracker.borrow_mut().record(index, settled);
            if complete {
                let outcomes = tracker.borrow_mut().collect_outcomes();
                resolve.resolve(outcomes);
            }
        });
    }
    aggregate
}
