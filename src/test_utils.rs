//! Test utilities for xpromise.
//!
//! Shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Lab runtime constructors
//! - Settlement recorders for observing handler calls

use crate::lab::{LabConfig, LabRuntime};
use crate::types::Settled;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Mutex, Once};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Acquire the global environment lock for tests that mutate env vars.
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Create a lab runtime with the default configuration.
#[must_use]
pub fn test_lab() -> LabRuntime {
    LabRuntime::new(LabConfig::default())
}

/// Records every settlement delivered to it, in arrival order.
#[derive(Debug)]
pub struct Recorder<T, E> {
    seen: Rc<RefCell<Vec<Settled<T, E>>>>,
}

impl<T, E> Clone for Recorder<T, E> {
    fn clone(&self) -> Self {
        Self {
            seen: Rc::clone(&self.seen),
        }
    }
}

impl<T: Clone, E: Clone> Default for Recorder<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, E: Clone> Recorder<T, E> {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seen: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Appends a settlement.
    pub fn push(&self, settled: Settled<T, E>) {
        self.seen.borrow_mut().push(settled);
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Settled<T, E>> {
        self.seen.borrow().clone()
    }

    /// Number of recorded settlements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Assert that a promise fulfilled with a specific value.
#[macro_export]
macro_rules! assert_fulfilled {
    ($promise:expr, $expected:expr) => {
        match $promise.settled() {
            Some($crate::types::Settled::Fulfilled(v)) => assert_eq!(v, $expected),
            other => panic!("expected Fulfilled({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that a promise rejected with a specific reason.
#[macro_export]
macro_rules! assert_rejected {
    ($promise:expr, $expected:expr) => {
        match $promise.settled() {
            Some($crate::types::Settled::Rejected(e)) => assert_eq!(e, $expected),
            other => panic!("expected Rejected({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that a promise is still pending.
#[macro_export]
macro_rules! assert_pending {
    ($promise:expr) => {
        assert!(
            $promise.is_pending(),
            "expected pending promise, got {:?}",
            $promise.state()
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::promise::Promise;
    use crate::runtime::JobQueue;

    #[test]
    #[should_panic(expected = "expected Fulfilled(1), got Some(Rejected(\"no\"))")]
    fn assert_fulfilled_reports_actual_outcome() {
        let queue = JobQueue::new();
        let promise: Promise<i32, String> = Promise::reject(&queue.handle(), "no".into());
        crate::assert_fulfilled!(promise, 1);
    }

    #[test]
    #[should_panic(expected = "expected Rejected(\"no\"), got None")]
    fn assert_rejected_reports_pending() {
        let queue = JobQueue::new();
        let (promise, _, _) = Promise::<i32, String>::with_resolvers(&queue.handle());
        crate::assert_rejected!(promise, "no".to_string());
    }
}
