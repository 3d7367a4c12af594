//! Thenable adoption: nested promises, foreign sources and sources that
//! misbehave by calling back more than once or failing on subscribe.

mod common;

use common::*;
use std::cell::Cell;
use std::rc::Rc;
use xpromise::{thenable, Promise, Reject, Resolution, Resolve, Thenable};

type P<T> = Promise<T, String>;

/// A foreign source that reports every outcome it is asked for, in order.
struct Chatty {
    calls: Rc<Cell<u32>>,
}

impl Thenable<i32, String> for Chatty {
    fn subscribe(&self, resolve: Resolve<i32, String>, reject: Reject<i32, String>) -> Result<(), String> {
        self.calls.set(self.calls.get() + 1);
        resolve.resolve(1);
        reject.reject("ignored".into());
        resolve.resolve(2);
        Err("also ignored".into())
    }
}

#[test]
fn only_first_capability_call_counts() {
    init_test_logging();
    test_phase!("only_first_capability_call_counts");

    let mut lab = test_lab();
    let calls = Rc::new(Cell::new(0));
    let adopted = P::resolve_with(
        &lab.scheduler(),
        Resolution::thenable(Chatty {
            calls: Rc::clone(&calls),
        }),
    );

    lab.run_until_quiescent();
    assert_fulfilled!(adopted, 1);
    assert_eq!(calls.get(), 1);
    test_complete!("only_first_capability_call_counts");
}

#[test]
fn subscribe_error_before_any_call_rejects() {
    init_test_logging();
    test_phase!("subscribe_error_before_any_call_rejects");

    let lab = test_lab();
    let failing = thenable::from_fn(|_resolve: Resolve<i32, String>, _reject| {
        Err("subscribe failed".to_string())
    });
    let adopted = P::resolve_with(&lab.scheduler(), Resolution::thenable(failing));
    assert_rejected!(adopted, "subscribe failed".to_string());
    test_complete!("subscribe_error_before_any_call_rejects");
}

#[test]
fn deeply_nested_promises_flatten_to_the_innermost_value() {
    init_test_logging();
    test_phase!("deeply_nested_promises_flatten_to_the_innermost_value");

    let mut lab = test_lab();
    let sched = lab.scheduler();
    let timers = lab.handle();

    let mut layer = delayed_value::<&str, String>(&sched, &timers, "core", 5);
    for _ in 0..20 {
        layer = P::resolve_with(&sched, layer.into_resolution());
    }

    lab.run_until_quiescent();
    assert_fulfilled!(layer, "core");
    test_complete!("deeply_nested_promises_flatten_to_the_innermost_value");
}

#[test]
fn thenable_resolving_with_another_thenable_is_followed() {
    init_test_logging();
    test_phase!("thenable_resolving_with_another_thenable_is_followed");

    let mut lab = test_lab();
    let timers = lab.handle();
    let outer = thenable::from_fn(move |resolve: Resolve<String, String>, _reject| {
        let timers = timers.clone();
        let inner = thenable::from_fn(move |resolve: Resolve<String, String>, _reject| {
            timers.set_timeout(7, move || resolve.resolve("inner".to_string()));
            Ok(())
        });
        resolve.resolve_with(Resolution::thenable(inner));
        Ok(())
    });

    let adopted = P::resolve_with(&lab.scheduler(), Resolution::thenable(outer));
    assert_pending!(adopted);
    lab.run_until_quiescent();
    assert_fulfilled!(adopted, "inner".to_string());
    assert_eq!(lab.now(), 7);
    test_complete!("thenable_resolving_with_another_thenable_is_followed");
}

#[test]
fn handler_returning_rejected_promise_rejects_downstream() {
    init_test_logging();
    test_phase!("handler_returning_rejected_promise_rejects_downstream");

    let mut lab = test_lab();
    let sched = lab.scheduler();
    let timers = lab.handle();
    let (s, t) = (sched.clone(), timers.clone());

    let downstream = P::resolve(&sched, 3).then(move |n| {
        Ok(delayed_reason::<i32, String>(&s, &t, format!("failed after {n}"), 3).into_resolution())
    });

    lab.run_until_quiescent();
    assert_rejected!(downstream, "failed after 3".to_string());
    test_complete!("handler_returning_rejected_promise_rejects_downstream");
}

#[test]
fn adopting_promise_is_distinct_from_source() {
    init_test_logging();
    test_phase!("adopting_promise_is_distinct_from_source");

    let mut lab = test_lab();
    let sched = lab.scheduler();
    let (source, resolve, _) = P::<i32>::with_resolvers(&sched);
    let adopted = P::resolve_with(&sched, source.clone().into_resolution());

    assert!(!adopted.ptr_eq(&source));
    resolve.resolve(9);
    assert_fulfilled!(source, 9);
    assert_pending!(adopted);

    lab.run_until_quiescent();
    assert_fulfilled!(adopted, 9);
    test_complete!("adopting_promise_is_distinct_from_source");
}

#[test]
fn thenable_that_never_calls_back_leaves_promise_pending() {
    init_test_logging();
    test_phase!("thenable_that_never_calls_back_leaves_promise_pending");

    let mut lab = test_lab();
    let silent = thenable::from_fn(|_resolve: Resolve<i32, String>, _reject| Ok(()));
    let adopted = P::resolve_with(&lab.scheduler(), Resolution::thenable(silent));
    let follow = adopted.then(|v| Ok(Resolution::Value(v + 1)));

    lab.run_until_quiescent();
    assert!(lab.is_quiescent());
    assert_pending!(adopted);
    assert_pending!(follow);
    test_complete!("thenable_that_never_calls_back_leaves_promise_pending");
}

#[test]
fn promise_resolved_with_itself_stays_pending() {
    init_test_logging();
    test_phase!("promise_resolved_with_itself_stays_pending");

    let mut lab = test_lab();
    let (promise, resolve, _) = P::<i32>::with_resolvers(&lab.scheduler());
    resolve.resolve_with(promise.clone().into_resolution());

    assert_eq!(lab.pending_microtasks(), 0);
    let steps = lab.run_until_quiescent();
    assert_with_log!(steps == 0, "self-adoption schedules nothing", 0, steps);
    assert_pending!(promise);
    assert!(resolve.is_pending());
    test_complete!("promise_resolved_with_itself_stays_pending");
}

#[test]
fn mutually_adopting_promises_both_stay_pending() {
    init_test_logging();
    test_phase!("mutually_adopting_promises_both_stay_pending");

    let mut lab = test_lab();
    let sched = lab.scheduler();
    let (a, resolve_a, _) = P::<i32>::with_resolvers(&sched);
    let (b, resolve_b, _) = P::<i32>::with_resolvers(&sched);
    resolve_a.resolve_with(b.clone().into_resolution());
    resolve_b.resolve_with(a.clone().into_resolution());

    let steps = lab.run_until_quiescent();
    assert_with_log!(steps == 0, "cycle schedules nothing", 0, steps);
    assert!(lab.is_quiescent());
    assert_pending!(a);
    assert_pending!(b);

    // Neither side is locked in: a direct settlement still wins and flows
    // around the cycle.
    resolve_a.resolve(4);
    lab.run_until_quiescent();
    assert_fulfilled!(a, 4);
    assert_fulfilled!(b, 4);
    test_complete!("mutually_adopting_promises_both_stay_pending");
}
