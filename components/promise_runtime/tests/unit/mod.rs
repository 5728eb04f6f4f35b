//! Unit tests for promise_runtime

mod thenable_test;
