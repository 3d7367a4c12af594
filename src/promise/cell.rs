//! Single-assignment state cell and the resolve/reject capabilities.
//!
//! The core owns the settled outcome and the list of waiters registered while
//! pending. Settlement is one-shot: the first call that finds the cell pending
//! stores the outcome and drains the waiters in registration order; every
//! later call is a no-op. That guard is the only protection against
//! misbehaving thenables that settle more than once.
//!
//! Waiters run synchronously inside the settling call. The chaining layer
//! only ever registers waiters that hand work to the scheduler, which is what
//! keeps user handlers off the settling call stack.

use super::thenable::Resolution;
use crate::tracing_compat::{debug, trace};
use crate::types::{PromiseState, Settled};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Observer of a settlement. Registered by exactly one chaining call.
pub(crate) type Waiter<T, E> = Box<dyn FnOnce(Settled<T, E>)>;

/// Shared handle to a core.
pub(crate) type SharedCore<T, E> = Rc<RefCell<Core<T, E>>>;

/// State, stored result and pending waiters of one promise.
pub(crate) struct Core<T, E> {
    /// `None` while pending.
    outcome: Option<Settled<T, E>>,
    waiters: SmallVec<[Waiter<T, E>; 2]>,
}

impl<T, E> Core<T, E> {
    pub(crate) fn new_shared() -> SharedCore<T, E> {
        Rc::new(RefCell::new(Self {
            outcome: None,
            waiters: SmallVec::new(),
        }))
    }

    pub(crate) fn state(&self) -> PromiseState {
        self.outcome
            .as_ref()
            .map_or(PromiseState::Pending, Settled::state)
    }

    pub(crate) fn waiter_count(&self) -> usize {
        self.waiters.len()
    }
}

impl<T: Clone, E: Clone> Core<T, E> {
    pub(crate) fn outcome(&self) -> Option<Settled<T, E>> {
        self.outcome.clone()
    }
}

/// Performs the Pending → settled transition.
///
/// Returns false, without touching anything, if the core already settled.
pub(crate) fn settle<T: Clone, E: Clone>(core: &SharedCore<T, E>, outcome: Settled<T, E>) -> bool {
    let waiters = {
        let mut inner = core.borrow_mut();
        if inner.outcome.is_some() {
            return false;
        }
        inner.outcome = Some(outcome.clone());
        std::mem::take(&mut inner.waiters)
    };

    trace!(
        state = %outcome.state(),
        waiters = waiters.len(),
        "promise settled"
    );

    for waiter in waiters {
        waiter(outcome.clone());
    }
    true
}

/// Registers `waiter`, or calls it right away if the core already settled.
pub(crate) fn observe<T: Clone, E: Clone>(core: &SharedCore<T, E>, waiter: Waiter<T, E>) {
    let settled = {
        let mut inner = core.borrow_mut();
        match inner.outcome.clone() {
            Some(settled) => settled,
            None => {
                inner.waiters.push(waiter);
                return;
            }
        }
    };
    waiter(settled);
}

/// The resolve capability handed to setup routines and thenables.
///
/// Resolving with a plain value fulfills the promise. Resolving with a
/// thenable subscribes to it and relays its eventual outcome back into this
/// same pair of capabilities, so nested thenables unwrap until a plain value
/// appears.
pub struct Resolve<T, E> {
    core: SharedCore<T, E>,
}

/// The reject capability handed to setup routines and thenables.
///
/// Reasons are stored as-is; they are never unwrapped.
pub struct Reject<T, E> {
    core: SharedCore<T, E>,
}

/// Builds the capability pair for a core.
pub(crate) fn capabilities<T, E>(core: &SharedCore<T, E>) -> (Resolve<T, E>, Reject<T, E>) {
    (
        Resolve {
            core: Rc::clone(core),
        },
        Reject {
            core: Rc::clone(core),
        },
    )
}

impl<T, E> Clone for Resolve<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Resolve<T, E> {
    /// Fulfills the promise with `value`. No-op once settled.
    pub fn resolve(&self, value: T) {
        self.resolve_with(Resolution::Value(value));
    }

    /// Resolves the promise from a plain value or a thenable source.
    ///
    /// A thenable does not settle the promise by itself: it is subscribed to,
    /// and whichever capability it calls first decides the outcome. If its
    /// `subscribe` fails, the promise rejects with that reason. A thenable
    /// that synchronously re-resolves with itself recurses without bound.
    pub fn resolve_with(&self, resolution: Resolution<T, E>) {
        if !self.is_pending() {
            debug!("resolve ignored: promise already settled");
            return;
        }
        match resolution {
            Resolution::Value(value) => {
                settle(&self.core, Settled::Fulfilled(value));
            }
            Resolution::Thenable(source) => {
                trace!("following thenable");
                let reject = self.rejecter();
                if let Err(reason) = source.subscribe(self.clone(), reject.clone()) {
                    debug!("thenable subscribe failed; rejecting");
                    reject.reject(reason);
                }
            }
        }
    }

    /// Returns the reject capability for the same promise.
    #[must_use]
    pub fn rejecter(&self) -> Reject<T, E> {
        Reject {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Reject<T, E> {
    /// Rejects the promise with `reason`. No-op once settled.
    pub fn reject(&self, reason: E) {
        if !settle(&self.core, Settled::Rejected(reason)) {
            debug!("reject ignored: promise already settled");
        }
    }
}

impl<T, E> Resolve<T, E> {
    /// True while the promise has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.core.borrow().state().is_pending()
    }
}

impl<T, E> Reject<T, E> {
    /// True while the promise has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.core.borrow().state().is_pending()
    }
}

impl<T, E> fmt::Debug for Resolve<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolve")
            .field("state", &self.core.borrow().state())
            .finish()
    }
}

impl<T, E> fmt::Debug for Reject<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reject")
            .field("state", &self.core.borrow().state())
            .finish()
    }
}
