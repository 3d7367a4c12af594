//! Thenable sources and the resolution input type.
//!
//! A thenable is anything that can deliver a single outcome to a pair of
//! capabilities. [`Promise`] is the canonical thenable; foreign sources
//! implement [`Thenable`] directly or wrap a closure with [`from_fn`].
//!
//! [`Resolution`] is what resolvers and handlers produce: either a plain value
//! or a thenable to adopt. There is deliberately no `From<T>` conversion, so
//! call sites stay unambiguous when `T` itself is a promise type.

use super::cell::{Reject, Resolve};
use super::Promise;
use std::fmt;
use std::rc::Rc;

/// A source that eventually calls exactly one of the given capabilities.
///
/// Implementations may call the capabilities synchronously, later, or more
/// than once; only the first call has any effect. Returning `Err` rejects the
/// adopting promise with that reason, unless it already settled.
pub trait Thenable<T, E> {
    /// Registers interest in this source's outcome.
    fn subscribe(&self, resolve: Resolve<T, E>, reject: Reject<T, E>) -> Result<(), E>;
}

/// Input to resolution: a plain value or a thenable to follow.
pub enum Resolution<T, E> {
    /// Fulfill with this value.
    Value(T),
    /// Adopt the outcome of this source.
    Thenable(Rc<dyn Thenable<T, E>>),
}

impl<T, E> Resolution<T, E> {
    /// Wraps a thenable source.
    pub fn thenable<S>(source: S) -> Self
    where
        S: Thenable<T, E> + 'static,
    {
        Self::Thenable(Rc::new(source))
    }

    /// Returns true if this resolution must be followed rather than stored.
    #[must_use]
    pub const fn is_thenable(&self) -> bool {
        matches!(self, Self::Thenable(_))
    }
}

impl<T: Clone + 'static, E: Clone + 'static> From<Promise<T, E>> for Resolution<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Self::thenable(promise)
    }
}

impl<T: Clone, E> Clone for Resolution<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Thenable(source) => Self::Thenable(Rc::clone(source)),
        }
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Thenable(_) => f.write_str("Thenable(..)"),
        }
    }
}

/// Thenable backed by a closure. See [`from_fn`].
pub struct FnThenable<F> {
    subscribe: F,
}

/// Builds a thenable from a closure taking the capability pair.
///
/// ```
/// use xpromise::{thenable, JobQueue, Promise, Resolution};
///
/// let queue = JobQueue::new();
/// let source = thenable::from_fn(|resolve: xpromise::Resolve<i32, String>, _reject| {
///     resolve.resolve(42);
///     Ok(())
/// });
/// let promise = Promise::resolve_with(&queue.handle(), Resolution::thenable(source));
/// assert_eq!(promise.value(), Some(42));
/// ```
pub fn from_fn<T, E, F>(subscribe: F) -> FnThenable<F>
where
    F: Fn(Resolve<T, E>, Reject<T, E>) -> Result<(), E>,
{
    FnThenable { subscribe }
}

impl<T, E, F> Thenable<T, E> for FnThenable<F>
where
    F: Fn(Resolve<T, E>, Reject<T, E>) -> Result<(), E>,
{
    fn subscribe(&self, resolve: Resolve<T, E>, reject: Reject<T, E>) -> Result<(), E> {
        (self.subscribe)(resolve, reject)
    }
}

impl<F> fmt::Debug for FnThenable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnThenable").finish_non_exhaustive()
    }
}
