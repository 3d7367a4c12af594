//! Lab runtime: a deterministic single-threaded event loop.
//!
//! The lab runtime executes promise work with:
//! - A microtask FIFO fed through [`Scheduler`]
//! - Virtual timers (`set_timeout`) that fire only when time is advanced
//! - A step limit that bounds runaway chains
//!
//! One turn drains the microtask queue, then, if nothing is left, jumps the
//! clock to the next timer deadline and fires every timer due there.

use super::config::LabConfig;
use super::virtual_time_wheel::{VirtualTimerHandle, VirtualTimerWheel};
use crate::error::{Error, Result};
use crate::runtime::{JobQueue, Scheduler, SchedulerHandle, Task};
use crate::tracing_compat::{debug, debug_span, trace, warn};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct LabShared {
    microtasks: JobQueue,
    timers: RefCell<VirtualTimerWheel>,
}

/// Clonable handle for scheduling work on a [`LabRuntime`].
///
/// Implements [`Scheduler`] (microtasks) and exposes virtual timers.
#[derive(Clone)]
pub struct LabHandle {
    shared: Rc<LabShared>,
}

impl LabHandle {
    /// Runs `task` once virtual time has advanced by `delay` ticks.
    ///
    /// A zero delay fires on the next timer phase, after pending microtasks.
    pub fn set_timeout<F>(&self, delay: u64, task: F) -> VirtualTimerHandle
    where
        F: FnOnce() + 'static,
    {
        let mut timers = self.shared.timers.borrow_mut();
        let deadline = timers.current_tick().saturating_add(delay);
        let handle = timers.insert(deadline, Box::new(task));
        trace!(
            timer_id = handle.timer_id(),
            deadline,
            "timer registered"
        );
        handle
    }

    /// Cancels a timer. Returns false if it already fired or was cancelled.
    pub fn clear_timeout(&self, handle: VirtualTimerHandle) -> bool {
        self.shared.timers.borrow_mut().cancel(handle)
    }

    /// Current virtual time in ticks.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.shared.timers.borrow().current_tick()
    }

    /// A [`SchedulerHandle`] for constructing promises.
    #[must_use]
    pub fn scheduler(&self) -> SchedulerHandle {
        Rc::new(self.clone())
    }
}

impl Scheduler for LabHandle {
    fn schedule(&self, task: Task) {
        self.shared.microtasks.schedule(task);
    }
}

impl fmt::Debug for LabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabHandle")
            .field("now", &self.now())
            .field("pending_microtasks", &self.shared.microtasks.len())
            .finish_non_exhaustive()
    }
}

/// What one [`LabRuntime::turn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    /// Microtasks executed.
    pub microtasks_run: usize,
    /// Timers fired.
    pub timers_fired: usize,
    /// Virtual time after the turn.
    pub tick: u64,
}

impl TurnReport {
    /// True if the turn ran nothing.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.microtasks_run == 0 && self.timers_fired == 0
    }
}

/// Work left over when a lab run stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuiescenceViolation {
    /// Microtasks still queued.
    #[error("{count} microtask(s) still queued")]
    PendingMicrotasks {
        /// Queue length.
        count: usize,
    },
    /// Timers still registered.
    #[error("{count} timer(s) still registered, next at {next_deadline:?}")]
    PendingTimers {
        /// Live timers.
        count: usize,
        /// Earliest deadline.
        next_deadline: Option<u64>,
    },
}

/// The deterministic lab runtime.
pub struct LabRuntime {
    shared: Rc<LabShared>,
    config: LabConfig,
    steps: u64,
    turns: u64,
}

impl LabRuntime {
    /// Creates a runtime with the given configuration.
    #[must_use]
    pub fn new(config: LabConfig) -> Self {
        let shared = Rc::new(LabShared {
            microtasks: JobQueue::new(),
            timers: RefCell::new(VirtualTimerWheel::starting_at(config.start_tick)),
        });
        Self {
            shared,
            config,
            steps: 0,
            turns: 0,
        }
    }

    /// Creates a runtime configured from `XPROMISE_LAB_*` variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(LabConfig::from_env()?))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LabConfig {
        &self.config
    }

    /// A handle for scheduling microtasks and timers.
    #[must_use]
    pub fn handle(&self) -> LabHandle {
        LabHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    /// A [`SchedulerHandle`] for constructing promises.
    #[must_use]
    pub fn scheduler(&self) -> SchedulerHandle {
        self.handle().scheduler()
    }

    /// Current virtual time in ticks.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.shared.timers.borrow().current_tick()
    }

    /// Total tasks executed so far.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Total turns taken so far.
    #[must_use]
    pub const fn turns(&self) -> u64 {
        self.turns
    }

    /// Queued microtasks.
    #[must_use]
    pub fn pending_microtasks(&self) -> usize {
        self.shared.microtasks.len()
    }

    /// Live timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.shared.timers.borrow().len()
    }

    /// True when neither microtasks nor timers remain.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.pending_microtasks() == 0 && self.pending_timers() == 0
    }

    /// Runs one turn of the event loop.
    pub fn turn(&mut self) -> TurnReport {
        let microtasks_run = self.drain_microtasks();
        let timers_fired =
            if self.shared.microtasks.is_empty() && !self.step_budget_exhausted() {
                self.fire_next_timers()
            } else {
                0
            };
        self.turns += 1;
        TurnReport {
            microtasks_run,
            timers_fired,
            tick: self.now(),
        }
    }

    /// Runs turns until no work remains or the step limit is hit.
    ///
    /// Returns the number of steps executed. Hitting the limit is logged as
    /// a warning; use [`try_run_until_quiescent`](Self::try_run_until_quiescent)
    /// to get an error instead.
    pub fn run_until_quiescent(&mut self) -> u64 {
        let _span = debug_span!("lab_run", start_tick = self.now()).entered();
        let start_steps = self.steps;

        while !self.is_quiescent() {
            if self.step_budget_exhausted() {
                warn!(
                    max_steps = ?self.config.max_steps,
                    pending_microtasks = self.pending_microtasks(),
                    pending_timers = self.pending_timers(),
                    "step limit reached before quiescence"
                );
                break;
            }
            self.turn();
        }

        self.steps - start_steps
    }

    /// Like [`run_until_quiescent`](Self::run_until_quiescent), but reports
    /// a step-limit stop as [`ErrorKind::StepLimitExceeded`].
    ///
    /// [`ErrorKind::StepLimitExceeded`]: crate::error::ErrorKind::StepLimitExceeded
    pub fn try_run_until_quiescent(&mut self) -> Result<u64> {
        let ran = self.run_until_quiescent();
        if self.is_quiescent() {
            Ok(ran)
        } else {
            Err(Error::step_limit_exceeded(
                self.config.max_steps.unwrap_or(self.steps),
                self.pending_microtasks() + self.pending_timers(),
            ))
        }
    }

    /// Runs all work due at or before `now() + ticks`, then moves the clock
    /// to that tick. Returns the number of steps executed.
    pub fn advance_time(&mut self, ticks: u64) -> u64 {
        let target = self.now().saturating_add(ticks);
        self.run_until(target)
    }

    /// Runs all work due at or before the absolute tick `target`, then moves
    /// the clock there. Timers due later stay registered.
    pub fn run_until(&mut self, target: u64) -> u64 {
        let start_steps = self.steps;
        loop {
            if self.step_budget_exhausted() {
                warn!(target, "step limit reached while advancing time");
                return self.steps - start_steps;
            }
            self.drain_microtasks();
            if !self.shared.microtasks.is_empty() {
                continue;
            }
            let next = self.shared.timers.borrow().next_deadline();
            match next {
                Some(deadline) if deadline <= target => {
                    self.fire_next_timers();
                }
                _ => break,
            }
        }
        let overdue = self.shared.timers.borrow_mut().advance_to(target);
        debug_assert!(overdue.is_empty());
        self.steps - start_steps
    }

    /// Lists work that is still outstanding.
    #[must_use]
    pub fn check_quiescence(&self) -> Vec<QuiescenceViolation> {
        let mut violations = Vec::new();
        let microtasks = self.pending_microtasks();
        if microtasks > 0 {
            violations.push(QuiescenceViolation::PendingMicrotasks { count: microtasks });
        }
        let timers = self.shared.timers.borrow();
        if !timers.is_empty() {
            violations.push(QuiescenceViolation::PendingTimers {
                count: timers.len(),
                next_deadline: timers.next_deadline(),
            });
        }
        violations
    }

    fn step_budget_exhausted(&self) -> bool {
        self.config.max_steps.is_some_and(|max| self.steps >= max)
    }

    fn drain_microtasks(&mut self) -> usize {
        let mut ran = 0_usize;
        while self
            .config
            .max_microtasks_per_turn
            .map_or(true, |limit| ran < limit)
            && !self.step_budget_exhausted()
        {
            if !self.shared.microtasks.run_next() {
                break;
            }
            ran += 1;
            self.steps += 1;
            trace!(step = self.steps, "microtask executed");
        }
        ran
    }

    fn fire_next_timers(&mut self) -> usize {
        // The borrow must end before timers run: they register more timers.
        let mut expired = self.shared.timers.borrow_mut().advance_to_next().into_iter();
        let mut fired = 0_usize;
        while let Some(timer) = expired.next() {
            if self.step_budget_exhausted() {
                let mut timers = self.shared.timers.borrow_mut();
                timers.requeue(timer);
                expired.for_each(|rest| timers.requeue(rest));
                debug!(fired, "step limit reached mid-batch; remaining timers requeued");
                break;
            }
            self.steps += 1;
            fired += 1;
            trace!(
                timer_id = timer.timer_id,
                deadline = timer.deadline,
                step = self.steps,
                "timer fired"
            );
            timer.fire();
        }
        fired
    }
}

impl Default for LabRuntime {
    fn default() -> Self {
        Self::new(LabConfig::default())
    }
}

impl fmt::Debug for LabRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabRuntime")
            .field("config", &self.config)
            .field("now", &self.now())
            .field("steps", &self.steps)
            .field("pending_microtasks", &self.pending_microtasks())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

/// Runs `f` against a fresh default runtime, drives it to quiescence and
/// asserts that no work was left over.
pub fn test<F, R>(f: F) -> R
where
    F: FnOnce(&mut LabRuntime) -> R,
{
    test_with_config(LabConfig::default(), f)
}

/// [`test`] with an explicit configuration.
pub fn test_with_config<F, R>(config: LabConfig, f: F) -> R
where
    F: FnOnce(&mut LabRuntime) -> R,
{
    let mut runtime = LabRuntime::new(config);
    let result = f(&mut runtime);
    runtime.run_until_quiescent();

    let violations = runtime.check_quiescence();
    assert!(
        violations.is_empty(),
        "Lab runtime left work behind: {violations:?}"
    );

    result
}
