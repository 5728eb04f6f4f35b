//! End-to-end tests: executors, chains and combinators working together.

use core_types::{Function, JsError, Value};
use integration_tests::{init_tracing, observer, thenable_of};
use promise_runtime::{FailureKind, RecordingSink, Runtime};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_executor_chain_and_all() {
    init_tracing();
    let (runtime, el) = Runtime::with_event_loop();

    let stored: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));
    let slot = stored.clone();
    let later = runtime.promise(move |resolve, _| {
        *slot.borrow_mut() = Some(resolve);
        Ok(())
    });

    let doubled = later.then(
        Some(Function::new(|args| match args.first() {
            Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
            _ => Err(JsError::type_error("expected a number")),
        })),
        None,
    );

    let combined = runtime
        .all(Value::array(vec![
            doubled.into(),
            thenable_of(Value::from("thenable")),
            Value::Smi(3),
        ]))
        .unwrap();

    el.run_until_idle().unwrap();
    assert!(!combined.is_settled());

    let resolve = stored.borrow_mut().take().unwrap();
    resolve.call(vec![Value::Smi(21)]).unwrap();
    el.run_until_idle().unwrap();

    assert_eq!(
        combined.result(),
        Some(Value::array(vec![
            Value::Smi(42),
            Value::from("thenable"),
            Value::Smi(3),
        ]))
    );
}

#[test]
fn test_failure_recovered_downstream() {
    init_tracing();
    let el = Rc::new(promise_runtime::EventLoop::new());
    let sink = Rc::new(RecordingSink::new());
    let runtime = Runtime::builder()
        .scheduler(el.clone())
        .diagnostics(sink.clone())
        .build();

    let (observed, on_value) = observer();
    runtime
        .resolved(Value::Smi(1))
        .then(
            Some(Function::new(|_| Err(JsError::throw(Value::from("X"))))),
            None,
        )
        .then(Some(Function::new(|_| Ok(Value::from("skipped")))), None)
        .then(None, Some(Function::new(|args| Ok(args[0].clone()))))
        .then(Some(on_value), None);

    el.run_until_idle().unwrap();
    assert_eq!(*observed.borrow(), vec![Value::from("X")]);
    assert_eq!(sink.kinds(), vec![FailureKind::Reaction]);
}

#[test]
fn test_nested_combinators() {
    init_tracing();
    let (runtime, el) = Runtime::with_event_loop();
    let inner = runtime
        .all(Value::array(vec![Value::Smi(1), Value::Smi(2)]))
        .unwrap();
    let outer = runtime
        .all_settled(Value::array(vec![inner.into(), Value::Smi(3)]))
        .unwrap();

    el.run_until_idle().unwrap();
    assert_eq!(
        outer.result(),
        Some(Value::array(vec![
            Value::array(vec![Value::Smi(1), Value::Smi(2)]),
            Value::Smi(3),
        ]))
    );
}

#[test]
fn test_all_settled_outlives_all() {
    init_tracing();
    let (runtime, el) = Runtime::with_event_loop();
    let slow = runtime.pending();
    let items = Value::array(vec![
        runtime.rejected(Value::from("e")).into(),
        slow.clone().into(),
    ]);
    let all = runtime.all(items.clone()).unwrap();
    let all_settled = runtime.all_settled(items).unwrap();

    el.run_until_idle().unwrap();
    assert!(all.is_rejected());
    assert!(!all_settled.is_settled());

    slow.resolve(Value::Null).unwrap();
    el.run_until_idle().unwrap();
    assert!(all_settled.is_rejected());
    assert_eq!(all_settled.result(), all.result());
}
