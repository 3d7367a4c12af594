//! Combinators over collections of promises.
//!
//! Every combinator accepts any iterable of [`Resolution`]s, so plain values,
//! promises and foreign thenables can be mixed. Each input is adopted into a
//! fresh promise first, which means already-settled inputs still report
//! through the scheduler.
//!
//! - [`all`](mod@all): fulfill with every value in input order, or reject with
//!   the first rejection
//! - [`race`](mod@race): settle like the first input to settle
//! - [`all_settled`](mod@all_settled): report every outcome, never reject
//!
//! [`Resolution`]: crate::promise::Resolution

pub mod all;
pub mod all_settled;
pub mod race;

pub use all::{all, AllTracker};
pub use all_settled::{all_settled, AllSettledTracker};
pub use race::race;
