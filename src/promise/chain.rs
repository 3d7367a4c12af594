//! Chaining: `then`, `catch` and `finally`.
//!
//! Every chaining call returns a new downstream promise. Handlers return
//! `Result<Resolution<U, E>, E>`: `Ok` resolves the downstream promise (plain
//! values fulfill it, thenables are adopted) and `Err` rejects it. A missing
//! handler passes the outcome through unchanged.

use super::{Promise, Resolution};
use crate::tracing_compat::debug;
use crate::types::Settled;
use std::rc::Rc;

impl<T: Clone + 'static, E: Clone + 'static> Promise<T, E> {
    /// Runs `handler` with the full outcome and resolves the downstream
    /// promise from its result.
    pub fn then_settled<U, F>(&self, handler: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(Settled<T, E>) -> Result<Resolution<U, E>, E> + 'static,
    {
        let (next, resolve, reject) = Promise::with_resolvers(&self.scheduler);
        self.observe(move |settled| match handler(settled) {
            Ok(resolution) => resolve.resolve_with(resolution),
            Err(reason) => {
                debug!("handler returned error; rejecting downstream promise");
                reject.reject(reason);
            }
        });
        next
    }

    /// Registers a fulfillment handler and a rejection handler.
    ///
    /// Exactly one of them runs, in a later turn.
    pub fn then_with<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + 'static,
        R: FnOnce(E) -> Result<Resolution<U, E>, E> + 'static,
    {
        self.then_settled(move |settled| match settled {
            Settled::Fulfilled(value) => on_fulfilled(value),
            Settled::Rejected(reason) => on_rejected(reason),
        })
    }

    /// Registers a fulfillment handler. Rejections pass through.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + 'static,
    {
        self.then_with(on_fulfilled, Err)
    }

    /// Registers a rejection handler. Fulfillments pass through.
    pub fn catch<R>(&self, on_rejected: R) -> Promise<T, E>
    where
        R: FnOnce(E) -> Result<Resolution<T, E>, E> + 'static,
    {
        self.then_with(|value| Ok(Resolution::Value(value)), on_rejected)
    }

    /// Runs `callback` on either outcome, then replays the original outcome.
    ///
    /// The callback sees neither value nor reason. Whatever it returns is
    /// resolved first; if that fails (the callback returns `Err`, or the
    /// thenable it returns rejects) the downstream promise rejects with that
    /// reason instead of replaying.
    pub fn finally<X, F>(&self, callback: F) -> Promise<T, E>
    where
        X: Clone + 'static,
        F: FnOnce() -> Result<Resolution<X, E>, E> + 'static,
    {
        let scheduler = Rc::clone(&self.scheduler);
        self.then_settled(move |settled| {
            let cleanup: Promise<X, E> = Promise::resolve_with(&scheduler, callback()?);
            let replay = cleanup.then(move |_| settled.into_result().map(Resolution::Value));
            Ok(replay.into_resolution())
        })
    }
}
