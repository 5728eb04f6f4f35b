//! Errors the engine raises on its own behalf.

use core_types::JsError;

/// Reason used when a promise is resolved with itself.
pub(crate) fn self_resolution_error() -> JsError {
    JsError::type_error("Promise.resolve(value): the value can not be the promise itself")
}

/// Wraps a failure thrown by an emitter's subscribe call.
pub(crate) fn subscription_error(cause: JsError) -> JsError {
    JsError::type_error(format!("failed to subscribe to emitter: {cause}"))
}
