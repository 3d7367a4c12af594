//! Race combinator: the first input to settle decides.
//!
//! # Semantics
//!
//! `race(sources)`:
//! 1. Adopt every source into a fresh promise
//! 2. Forward the first outcome observed, fulfillment or rejection
//! 3. Discard every later outcome
//!
//! Losers are not cancelled; promises have no cancellation. An empty input
//! never settles.
//!
//! Inputs that settle in the same turn are not ordered by position. A
//! promise input is adopted through one relay reaction, while a plain value
//! settles its adopted promise on the spot, so an already-settled promise
//! loses to a plain value listed after it.

use crate::promise::{Promise, Resolution};
use crate::runtime::SchedulerHandle;
use crate::tracing_compat::{debug, trace};
use crate::types::Settled;

/// Settles like the first source to settle.
///
/// ```
/// use xpromise::{race, JobQueue, Promise, Resolution};
///
/// let queue = JobQueue::new();
/// let sched = queue.handle();
/// let (never, _, _) = Promise::<&str, String>::with_resolvers(&sched);
/// let winner = race(&sched, vec![never.into(), Resolution::Value("B")]);
/// queue.run_pending();
/// assert_eq!(winner.value(), Some("B"));
/// ```
pub fn race<T, E, I>(scheduler: &SchedulerHandle, sources: I) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Resolution<T, E>>,
{
    let (winner, resolve, reject) = Promise::with_resolvers(scheduler);
    let mut entrants = 0_usize;
    for (index, source) in sources.into_iter().enumerate() {
        entrants += 1;
        let resolve = resolve.clone();
        let reject = reject.clone();
        Promise::resolve_with(scheduler, source).observe(move |settled| {
            if !resolve.is_pending() {
                debug!(index, state = %settled.state(), "race already decided; outcome discarded");
                return;
            }
            trace!(index, state = %settled.state(), "race decided");
            match settled {
                Settled::Fulfilled(value) => resolve.resolve(value),
                Settled::Rejected(reason) => reject.reject(reason),
            }
        });
    }
    if entrants == 0 {
        debug!("race over empty input never settles");
    }
    winner
}
