//! Deterministic lab host for driving promises.
//!
//! The lab host provides:
//!
//! - A microtask queue behind the [`Scheduler`](crate::runtime::Scheduler) seam
//! - Virtual timers (no wall-clock dependencies)
//! - Step limits and quiescence checks for tests
//!
//! ```
//! use xpromise::lab::LabRuntime;
//! use xpromise::{race, Promise, Resolution};
//!
//! let mut lab = LabRuntime::default();
//! let sched = lab.scheduler();
//! let timers = lab.handle();
//!
//! let delayed = |label: &'static str, delay: u64| {
//!     let timers = timers.clone();
//!     Promise::<&str, String>::new(&sched, move |resolve, _| {
//!         timers.set_timeout(delay, move || resolve.resolve(label));
//!         Ok(())
//!     })
//! };
//! let winner = race(&sched, vec![delayed("A", 30).into(), delayed("B", 20).into()]);
//!
//! lab.run_until_quiescent();
//! assert_eq!(winner.value(), Some("B"));
//! ```

pub mod config;
pub mod env_config;
pub mod runtime;
pub mod virtual_time_wheel;

pub use config::LabConfig;
pub use runtime::{
    test, test_with_config, LabHandle, LabRuntime, QuiescenceViolation, TurnReport,
};
pub use virtual_time_wheel::{ExpiredTimer, VirtualTimerHandle, VirtualTimerWheel};
