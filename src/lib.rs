//! xpromise: single-assignment deferred values for Rust.
//!
//! # Overview
//!
//! A [`Promise`] is a placeholder for an outcome produced later. It settles
//! exactly once, fulfilled with a value or rejected with a reason, and hands
//! that outcome to every handler chained onto it. Handlers never run inside
//! the call that registered them: they are deferred through an injected
//! [`Scheduler`], so the host decides when work happens.
//!
//! # Core Guarantees
//!
//! - **One-shot settlement**: the first resolve/reject wins, later calls are
//!   ignored
//! - **Deferred handlers**: handlers run in a later scheduling turn, FIFO
//! - **Thenable adoption**: resolving with a promise or any [`Thenable`]
//!   follows it until a plain value appears
//! - **Typed failures**: rejection reasons are an ordinary type parameter;
//!   handlers fail by returning `Err`
//!
//! # Module Structure
//!
//! - [`promise`]: the promise type, capabilities, thenables and chaining
//! - [`combinator`]: `all`, `race` and `all_settled`
//! - [`runtime`]: the [`Scheduler`] seam and the [`JobQueue`] FIFO
//! - [`lab`]: deterministic event loop with virtual timers, for tests and
//!   demos
//! - [`types`]: state tags and settled-outcome snapshots
//! - [`error`]: error types for host configuration and execution
//!
//! # Example
//!
//! ```
//! use xpromise::{JobQueue, Promise, Resolution};
//!
//! let queue = JobQueue::new();
//! let sched = queue.handle();
//!
//! let p: Promise<i32, String> = Promise::reject(&sched, "boom".into());
//! let recovered = p
//!     .catch(|reason| Ok(Resolution::Value(reason.len() as i32)))
//!     .finally(|| Ok(Resolution::<(), String>::Value(())));
//!
//! queue.run_pending();
//! assert_eq!(recovered.value(), Some(4));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

pub mod combinator;
pub mod error;
pub mod lab;
pub mod promise;
pub mod runtime;
pub mod tracing_compat;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use combinator::{all, all_settled, race};
pub use error::{Error, ErrorCategory, ErrorKind, Result, ResultExt};
pub use lab::{LabConfig, LabRuntime};
pub use promise::{thenable, Promise, Reject, Resolution, Resolve, Thenable};
pub use runtime::{JobQueue, Scheduler, SchedulerHandle, Task};
pub use types::{PromiseState, Settled};
