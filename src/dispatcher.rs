//! The contract the [`crate::Endpoint`] consumes to locate a handler by method
//! name, and the sum type a handler uses to signal "here's the answer" versus
//! "here's a deferred computation".

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::RpcError;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// What a handler hands back to the endpoint: either it already knows the
/// answer, or it has handed off to a deferred computation the endpoint should
/// spawn and track so a matching `$/cancelRequest` can be honored.
pub enum HandlerOutcome {
    Ready(Result<Value, RpcError>),
    Deferred(BoxFuture<Result<Value, RpcError>>),
}

impl HandlerOutcome {
    pub fn ready_ok(value: Value) -> Self {
        HandlerOutcome::Ready(Ok(value))
    }

    pub fn ready_err(err: RpcError) -> Self {
        HandlerOutcome::Ready(Err(err))
    }

    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        HandlerOutcome::Deferred(Box::pin(fut))
    }
}

/// A method handler. `params` is the decoded JSON value as received, possibly
/// `Value::Null` if the message carried none.
pub trait Handler: Send + Sync {
    fn call(&self, params: Option<Value>) -> HandlerOutcome;
}

impl<F> Handler for F
where
    F: Fn(Option<Value>) -> HandlerOutcome + Send + Sync,
{
    fn call(&self, params: Option<Value>) -> HandlerOutcome {
        (self)(params)
    }
}

/// Lookup from method name to handler. Absence signals "not found"; the
/// endpoint alone decides what that means (MethodNotFound for requests, a log
/// line for notifications).
pub trait Dispatcher: Send + Sync {
    fn handler(&self, method: &str) -> Option<Arc<dyn Handler>>;
}

/// The default dispatcher: a plain name-to-handler map, built incrementally
/// and then handed to the endpoint.
#[derive(Default)]
pub struct MethodMap {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl MethodMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, method: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.handlers.insert(method.into(), Arc::new(handler));
        self
    }
}

impl Dispatcher for MethodMap {
    fn handler(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(method).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unregistered_method_is_absent() {
        let map = MethodMap::new();
        assert!(map.handler("nope").is_none());
    }

    #[test]
    fn registered_method_is_found() {
        let map = MethodMap::new().register("ping", |_params: Option<Value>| {
            HandlerOutcome::ready_ok(json!("pong"))
        });
        assert!(map.handler("ping").is_some());
    }
}
