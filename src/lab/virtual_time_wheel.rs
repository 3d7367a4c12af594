//! Virtual timer wheel for the lab host.
//!
//! Timers are stored as tasks keyed by a deadline in virtual ticks
//! (milliseconds). Nothing here reads the wall clock:
//!
//! - Same tick → same timers expire
//! - Expiration order is deadline first, then registration order
//! - Time only moves when the host advances it
//!
//! # Example
//!
//! ```
//! use xpromise::lab::VirtualTimerWheel;
//!
//! let mut wheel = VirtualTimerWheel::new();
//! wheel.insert(100, Box::new(|| {}));
//! wheel.insert(50, Box::new(|| {}));
//!
//! let expired = wheel.advance_to_next();
//! assert_eq!(expired.len(), 1);
//! assert_eq!(wheel.current_tick(), 50);
//! ```

use crate::runtime::Task;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

struct VirtualTimer {
    deadline: u64,
    timer_id: u64,
    task: Task,
}

impl Eq for VirtualTimer {}

impl PartialEq for VirtualTimer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.timer_id == other.timer_id
    }
}

impl Ord for VirtualTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest deadline first, then lowest timer_id.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.timer_id.cmp(&self.timer_id))
    }
}

impl PartialOrd for VirtualTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Handle for cancelling a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualTimerHandle {
    timer_id: u64,
    deadline: u64,
}

impl VirtualTimerHandle {
    /// Registration id, unique per wheel.
    #[must_use]
    pub const fn timer_id(&self) -> u64 {
        self.timer_id
    }

    /// Tick at which the timer fires.
    #[must_use]
    pub const fn deadline(&self) -> u64 {
        self.deadline
    }
}

/// A timer removed from the wheel because its deadline was reached.
pub struct ExpiredTimer {
    /// Registration id.
    pub timer_id: u64,
    /// Tick the timer was due at.
    pub deadline: u64,
    /// The work to run.
    pub task: Task,
}

impl ExpiredTimer {
    /// Runs the timer's task.
    pub fn fire(self) {
        (self.task)();
    }
}

impl fmt::Debug for ExpiredTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiredTimer")
            .field("timer_id", &self.timer_id)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Deterministic timer wheel over virtual ticks.
pub struct VirtualTimerWheel {
    heap: BinaryHeap<VirtualTimer>,
    current_tick: u64,
    next_timer_id: u64,
    /// Ids still due to fire. Cancelled entries stay in the heap until they
    /// reach the top, but never appear here.
    live: HashSet<u64>,
}

impl Default for VirtualTimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTimerWheel {
    /// Creates an empty wheel at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates an empty wheel at `tick`.
    #[must_use]
    pub fn starting_at(tick: u64) -> Self {
        Self {
            heap: BinaryHeap::new(),
            current_tick: tick,
            next_timer_id: 0,
            live: HashSet::new(),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Number of live (not cancelled) timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True if no live timers remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Registers `task` to fire at the absolute tick `deadline`.
    ///
    /// A deadline at or before the current tick fires on the next advance.
    pub fn insert(&mut self, deadline: u64, task: Task) -> VirtualTimerHandle {
        let timer_id = self.next_timer_id;
        self.next_timer_id += 1;
        self.heap.push(VirtualTimer {
            deadline,
            timer_id,
            task,
        });
        self.live.insert(timer_id);
        VirtualTimerHandle { timer_id, deadline }
    }

    /// Puts an expired timer back, keeping its id and deadline, so it fires
    /// on the next advance ahead of later registrations.
    pub fn requeue(&mut self, timer: ExpiredTimer) {
        self.live.insert(timer.timer_id);
        self.heap.push(VirtualTimer {
            deadline: timer.deadline,
            timer_id: timer.timer_id,
            task: timer.task,
        });
    }

    /// Cancels a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: VirtualTimerHandle) -> bool {
        let removed = self.live.remove(&handle.timer_id);
        self.drop_cancelled_head();
        removed
    }

    /// Deadline of the earliest live timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|timer| timer.deadline)
    }

    /// Advances to the earliest live deadline and returns the timers due
    /// there. Returns nothing, and leaves time alone, if no timers remain.
    pub fn advance_to_next(&mut self) -> Vec<ExpiredTimer> {
        match self.next_deadline() {
            Some(deadline) => self.advance_to(deadline.max(self.current_tick)),
            None => Vec::new(),
        }
    }

    /// Advances time by `ticks`, returning every timer that came due.
    pub fn advance_by(&mut self, ticks: u64) -> Vec<ExpiredTimer> {
        self.advance_to(self.current_tick.saturating_add(ticks))
    }

    /// Advances to the absolute tick `target_tick`, returning every timer due
    /// at or before it in deadline, then registration, order.
    ///
    /// Time never moves backwards; a target in the past only collects
    /// overdue timers.
    pub fn advance_to(&mut self, target_tick: u64) -> Vec<ExpiredTimer> {
        let mut expired = Vec::new();
        while self
            .heap
            .peek()
            .is_some_and(|timer| timer.deadline <= target_tick)
        {
            let Some(timer) = self.heap.pop() else {
                break;
            };
            if !self.live.remove(&timer.timer_id) {
                continue;
            }
            expired.push(ExpiredTimer {
                timer_id: timer.timer_id,
                deadline: timer.deadline,
                task: timer.task,
            });
        }
        self.current_tick = self.current_tick.max(target_tick);
        self.drop_cancelled_head();
        expired
    }

    /// Drops every timer without running it.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    // Keeps the heap top live, so `next_deadline` can peek.
    fn drop_cancelled_head(&mut self) {
        while self
            .heap
            .peek()
            .is_some_and(|timer| !self.live.contains(&timer.timer_id))
        {
            self.heap.pop();
        }
    }
}

impl fmt::Debug for VirtualTimerWheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualTimerWheel")
            .field("current_tick", &self.current_tick)
            .field("pending", &self.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}
