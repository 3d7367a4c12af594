//! Single-assignment deferred values.
//!
//! A [`Promise`] starts pending and settles exactly once, either fulfilled
//! with a value or rejected with a reason. Observers registered through the
//! chaining methods always run through the promise's [`Scheduler`], never on
//! the call stack that registered them or that settled the promise.
//!
//! # Submodules
//!
//! - [`thenable`]: the [`Thenable`] trait, [`Resolution`] input type and
//!   closure-backed thenables
//! - `cell`: the one-shot state cell and the [`Resolve`]/[`Reject`]
//!   capabilities
//! - `chain`: `then`, `catch` and `finally`
//!
//! # Example
//!
//! ```
//! use xpromise::{JobQueue, Promise, Resolution};
//!
//! let queue = JobQueue::new();
//! let sched = queue.handle();
//!
//! let greeting: Promise<String, String> = Promise::new(&sched, |resolve, _reject| {
//!     resolve.resolve("Hello".to_string());
//!     Ok(())
//! });
//! let shouted = greeting.then(|s| Ok(Resolution::Value(s + "!")));
//!
//! assert!(shouted.is_pending());
//! queue.run_pending();
//! assert_eq!(shouted.value().as_deref(), Some("Hello!"));
//! ```
//!
//! [`Scheduler`]: crate::runtime::Scheduler

mod chain;
mod cell;
pub mod thenable;

pub use self::cell::{Reject, Resolve};
pub use thenable::{Resolution, Thenable};

use self::cell::{Core, SharedCore};
use crate::runtime::SchedulerHandle;
use crate::tracing_compat::{debug, trace};
use crate::types::{PromiseState, Settled};
use std::fmt;
use std::rc::Rc;

/// A deferred value that settles once.
///
/// Cloning yields another handle to the same promise.
pub struct Promise<T, E> {
    core: SharedCore<T, E>,
    scheduler: SchedulerHandle,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            scheduler: Rc::clone(&self.scheduler),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Promise<T, E> {
    /// Creates a promise and runs `setup` synchronously with its
    /// capabilities.
    ///
    /// If `setup` returns `Err` the promise rejects with that reason, unless a
    /// capability already settled it.
    pub fn new<F>(scheduler: &SchedulerHandle, setup: F) -> Self
    where
        F: FnOnce(Resolve<T, E>, Reject<T, E>) -> Result<(), E>,
    {
        let (promise, resolve, reject) = Self::with_resolvers(scheduler);
        if let Err(reason) = setup(resolve, reject.clone()) {
            debug!("setup routine failed; rejecting");
            reject.reject(reason);
        }
        promise
    }

    /// Creates a pending promise and hands back its capabilities.
    #[must_use]
    pub fn with_resolvers(scheduler: &SchedulerHandle) -> (Self, Resolve<T, E>, Reject<T, E>) {
        let core = Core::new_shared();
        let (resolve, reject) = self::cell::capabilities(&core);
        let promise = Self {
            core,
            scheduler: Rc::clone(scheduler),
        };
        (promise, resolve, reject)
    }

    /// A promise already fulfilled with `value`.
    #[must_use]
    pub fn resolve(scheduler: &SchedulerHandle, value: T) -> Self {
        Self::resolve_with(scheduler, Resolution::Value(value))
    }

    /// A promise resolved from `resolution`.
    ///
    /// Plain values fulfill immediately. Thenables, including other promises,
    /// are adopted: the returned promise is always a fresh one that settles
    /// however the source settles.
    #[must_use]
    pub fn resolve_with(scheduler: &SchedulerHandle, resolution: Resolution<T, E>) -> Self {
        let (promise, resolve, _reject) = Self::with_resolvers(scheduler);
        resolve.resolve_with(resolution);
        promise
    }

    /// A promise already rejected with `reason`.
    #[must_use]
    pub fn reject(scheduler: &SchedulerHandle, reason: E) -> Self {
        let (promise, _resolve, reject) = Self::with_resolvers(scheduler);
        reject.reject(reason);
        promise
    }

    /// Snapshot of the outcome, or `None` while pending.
    #[must_use]
    pub fn settled(&self) -> Option<Settled<T, E>> {
        self.core.borrow().outcome()
    }

    /// The fulfilled value, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        match self.settled()? {
            Settled::Fulfilled(value) => Some(value),
            Settled::Rejected(_) => None,
        }
    }

    /// The rejection reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<E> {
        match self.settled()? {
            Settled::Fulfilled(_) => None,
            Settled::Rejected(reason) => Some(reason),
        }
    }

    /// Wraps this promise for adoption by another resolver.
    #[must_use]
    pub fn into_resolution(self) -> Resolution<T, E> {
        Resolution::from(self)
    }

    /// Calls `reaction` with the outcome in a later turn.
    ///
    /// The reaction is handed to the scheduler at settlement time, or right
    /// away if the promise already settled. No downstream promise is created.
    pub(crate) fn observe<F>(&self, reaction: F)
    where
        F: FnOnce(Settled<T, E>) + 'static,
    {
        let scheduler = Rc::clone(&self.scheduler);
        self::cell::observe(
            &self.core,
            Box::new(move |settled: Settled<T, E>| {
                trace!(state = %settled.state(), "reaction scheduled");
                scheduler.schedule(Box::new(move || reaction(settled)));
            }),
        );
    }
}

impl<T, E> Promise<T, E> {
    /// Current state tag.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.core.borrow().state()
    }

    /// True while neither fulfilled nor rejected.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    /// True once fulfilled.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.state() == PromiseState::Fulfilled
    }

    /// True once rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.state() == PromiseState::Rejected
    }

    /// The scheduler this promise defers handlers through.
    #[must_use]
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// True if both handles refer to the same promise.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Thenable<T, E> for Promise<T, E> {
    fn subscribe(&self, resolve: Resolve<T, E>, reject: Reject<T, E>) -> Result<(), E> {
        self.observe(move |settled| match settled {
            Settled::Fulfilled(value) => resolve.resolve(value),
            Settled::Rejected(reason) => reject.reject(reason),
        });
        Ok(())
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Promise")
            .field("state", &core.state())
            .field("waiters", &core.waiter_count())
            .finish_non_exhaustive()
    }
}
