//! The deferred-execution seam.
//!
//! Promises never run handlers synchronously inside the call that registered
//! them. Instead they hand a [`Task`] to a [`Scheduler`], which runs it in a
//! later turn. The only ordering contract is FIFO: tasks scheduled through the
//! same scheduler run in the order they were scheduled.
//!
//! [`JobQueue`] is the reference implementation: an unbounded FIFO that the
//! host drains explicitly. The lab host wraps it together with a virtual timer
//! wheel.

use crate::tracing_compat::trace;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Shared handle to a scheduler, stored by every promise.
pub type SchedulerHandle = Rc<dyn Scheduler>;

/// Runs tasks in a later scheduling turn.
pub trait Scheduler {
    /// Queues `task` to run after the current turn, FIFO relative to other
    /// scheduled tasks. Must not run the task before returning.
    fn schedule(&self, task: Task);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, task: Task) {
        (**self).schedule(task);
    }
}

/// FIFO job queue.
///
/// Cloning yields another handle to the same queue. Tasks scheduled while the
/// queue is being drained are appended and run in the same drain.
#[derive(Clone, Default)]
pub struct JobQueue {
    jobs: Rc<RefCell<VecDeque<Task>>>,
    executed: Rc<Cell<u64>>,
}

impl JobQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a [`SchedulerHandle`] feeding this queue.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        Rc::new(self.clone())
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.borrow().len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.borrow().is_empty()
    }

    /// Total number of tasks run through this queue.
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.executed.get()
    }

    /// Runs the oldest queued task. Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        // The borrow must end before the task runs: tasks schedule more tasks.
        let next = self.jobs.borrow_mut().pop_front();
        match next {
            Some(task) => {
                task();
                self.executed.set(self.executed.get() + 1);
                true
            }
            None => false,
        }
    }

    /// Runs at most `limit` tasks, returning how many ran.
    pub fn run_batch(&self, limit: usize) -> usize {
        let mut ran = 0;
        while ran < limit && self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Runs tasks until the queue is empty, including tasks scheduled by the
    /// tasks being run. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "job queue drained");
        }
        ran
    }

    /// Drops every queued task without running it.
    pub fn clear(&self) {
        self.jobs.borrow_mut().clear();
    }
}

impl Scheduler for JobQueue {
    fn schedule(&self, task: Task) {
        self.jobs.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue")
            .field("queued", &self.len())
            .field("executed", &self.executed())
            .finish()
    }
}
