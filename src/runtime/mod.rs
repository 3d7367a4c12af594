//! Scheduling seam between promises and their host.
//!
//! - [`scheduler`]: the [`Scheduler`] trait promises consume, and the
//!   [`JobQueue`] FIFO implementation

pub mod scheduler;

pub use scheduler::{JobQueue, Scheduler, SchedulerHandle, Task};
