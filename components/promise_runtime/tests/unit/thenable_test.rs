//! Unit tests for foreign thenable adoption

use crate::support::ThrowingGetter;
use core_types::{Function, JsError, JsObject, PlainObject, Value};
use promise_runtime::{
    is_async_value, EventLoop, FailureKind, RecordingSink, Runtime, PROMISE_SIGNATURE,
};
use std::cell::RefCell;
use std::rc::Rc;

fn thenable<F>(then: F) -> Value
where
    F: Fn(Function, Function) -> Result<(), JsError> + 'static,
{
    Value::object(PlainObject::new().with(
        "then",
        Value::function(move |args| {
            let mut args = args.into_iter();
            let resolve = args.next().and_then(|v| v.as_function().cloned());
            let reject = args.next().and_then(|v| v.as_function().cloned());
            match (resolve, reject) {
                (Some(resolve), Some(reject)) => then(resolve, reject)?,
                _ => return Err(JsError::type_error("then expects two callbacks")),
            }
            Ok(Value::Undefined)
        }),
    ))
}

#[test]
fn only_the_first_callback_counts() {
    let (runtime, el) = Runtime::with_event_loop();
    let promise = runtime.resolved(thenable(|resolve, reject| {
        resolve.call(vec![Value::Smi(1)])?;
        reject.call(vec![Value::from("no")])?;
        resolve.call(vec![Value::Smi(2)])?;
        Ok(())
    }));
    el.run_until_idle().unwrap();
    assert!(promise.is_fulfilled());
    assert_eq!(promise.result(), Some(Value::Smi(1)));
}

#[test]
fn reject_first_wins_too() {
    let (runtime, el) = Runtime::with_event_loop();
    let promise = runtime.resolved(thenable(|resolve, reject| {
        reject.call(vec![Value::from("no")])?;
        resolve.call(vec![Value::Smi(2)])?;
        Ok(())
    }));
    el.run_until_idle().unwrap();
    assert!(promise.is_rejected());
    assert_eq!(promise.result(), Some(Value::from("no")));
}

#[test]
fn throwing_then_rejects() {
    let (runtime, el) = Runtime::with_event_loop();
    let promise = runtime.resolved(thenable(|_, _| Err(JsError::throw(Value::from("bad")))));
    el.run_until_idle().unwrap();
    assert!(promise.is_rejected());
    assert_eq!(promise.result(), Some(Value::from("bad")));
}

#[test]
fn throw_after_resolving_is_ignored() {
    let (runtime, el) = Runtime::with_event_loop();
    let promise = runtime.resolved(thenable(|resolve, _| {
        resolve.call(vec![Value::Smi(3)])?;
        Err(JsError::throw(Value::from("ignored")))
    }));
    el.run_until_idle().unwrap();
    assert_eq!(promise.result(), Some(Value::Smi(3)));
}

#[test]
fn throwing_property_read_rejects() {
    let el = Rc::new(EventLoop::new());
    let sink = Rc::new(RecordingSink::new());
    let runtime = Runtime::builder()
        .scheduler(el.clone())
        .diagnostics(sink.clone())
        .build();

    let promise = runtime.resolved(Value::object(ThrowingGetter));
    el.run_until_idle().unwrap();
    assert!(promise.is_rejected());
    assert_eq!(promise.result(), Some(Value::from("getter")));
    assert_eq!(sink.kinds(), vec![FailureKind::Adoption]);
}

#[test]
fn asynchronous_thenable_settles_later() {
    let (runtime, el) = Runtime::with_event_loop();
    let stored: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));
    let slot = stored.clone();
    let promise = runtime.resolved(thenable(move |resolve, _| {
        *slot.borrow_mut() = Some(resolve);
        Ok(())
    }));

    el.run_until_idle().unwrap();
    assert!(!promise.is_settled());

    let resolve = stored.borrow_mut().take().unwrap();
    resolve.call(vec![Value::Smi(9)]).unwrap();
    el.run_until_idle().unwrap();
    assert_eq!(promise.result(), Some(Value::Smi(9)));
}

#[test]
fn nested_thenables_are_unwrapped() {
    let (runtime, el) = Runtime::with_event_loop();
    let promise = runtime.resolved(thenable(|resolve, _| {
        let inner = thenable(|resolve, _| {
            resolve.call(vec![Value::from("deep")])?;
            Ok(())
        });
        resolve.call(vec![inner])?;
        Ok(())
    }));
    el.run_until_idle().unwrap();
    assert_eq!(promise.result(), Some(Value::from("deep")));
}

#[test]
fn object_without_callable_then_is_a_plain_value() {
    let (runtime, el) = Runtime::with_event_loop();
    let object = Value::object(PlainObject::new().with("then", Value::Smi(1)));
    let promise = runtime.resolved(object.clone());
    el.run_until_idle().unwrap();
    assert_eq!(promise.result(), Some(object));
}

#[test]
fn marked_foreign_promise_is_recognised_and_adopted() {
    let (runtime, el) = Runtime::with_event_loop();
    let foreign = Value::object(
        PlainObject::new()
            .with(PROMISE_SIGNATURE, Value::Boolean(true))
            .with(
                "then",
                Value::function(|args| {
                    if let Some(resolve) = args.first().and_then(|v| v.as_function()) {
                        resolve.call(vec![Value::Smi(11)])?;
                    }
                    Ok(Value::Undefined)
                }),
            ),
    );
    assert!(is_async_value(&foreign));

    let promise = runtime.resolved(foreign);
    el.run_until_idle().unwrap();
    assert_eq!(promise.result(), Some(Value::Smi(11)));
}

#[test]
fn engine_promise_exposes_callable_then() {
    let (runtime, el) = Runtime::with_event_loop();
    let promise = runtime.resolved(Value::Smi(4));
    let value: Value = promise.into();
    let then = value.as_object().unwrap().get("then").unwrap();

    let seen = Rc::new(RefCell::new(None));
    let s = seen.clone();
    let derived = then
        .as_function()
        .unwrap()
        .call(vec![Value::function(move |args| {
            *s.borrow_mut() = args.into_iter().next();
            Ok(Value::Undefined)
        })])
        .unwrap();
    assert!(is_async_value(&derived));

    el.run_until_idle().unwrap();
    assert_eq!(*seen.borrow(), Some(Value::Smi(4)));
}
