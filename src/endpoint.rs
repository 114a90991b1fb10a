//! The symmetric JSON-RPC peer: routes inbound frames, tracks outbound
//! requests, honors cancellation, and isolates handler failures.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};

use crate::concurrency::spawn_cancellable;
use crate::dispatcher::{BoxFuture, Dispatcher, HandlerOutcome};
use crate::error::RpcError;
use crate::id::{default_id_generator, IdGenerator};
use crate::message::{Message, Notification, Request, RequestId, Response};

pub const CANCEL_METHOD: &str = "$/cancelRequest";

/// The host-provided sink for outbound messages. Typically backed by a
/// [`crate::frame::FrameWriter`], but any async callable taking a decoded
/// message will do — serialization to bytes is the host's concern, not the
/// endpoint's.
pub trait MessageConsumer: Send + Sync {
    fn consume(&self, message: Value) -> BoxFuture<()>;
}

impl<F, Fut> MessageConsumer for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn consume(&self, message: Value) -> BoxFuture<()> {
        Box::pin((self)(message))
    }
}

struct Inner {
    dispatcher: Arc<dyn Dispatcher>,
    consumer: Arc<dyn MessageConsumer>,
    id_gen: IdGenerator,
    /// Inbound requests this peer is currently executing.
    client_requests: DashMap<RequestId, AbortHandle>,
    /// Outbound requests this peer sent, awaiting a response.
    server_requests: DashMap<RequestId, oneshot::Sender<Result<Value, RpcError>>>,
}

/// A JSON-RPC peer built from a dispatcher (to answer inbound requests) and a
/// message consumer (to emit outbound bytes). Cheaply cloneable; all clones
/// share the same request tables.
#[derive(Clone)]
pub struct Endpoint(Arc<Inner>);

impl Endpoint {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, consumer: Arc<dyn MessageConsumer>) -> Self {
        Self::with_id_generator(dispatcher, consumer, default_id_generator())
    }

    pub fn with_id_generator(
        dispatcher: Arc<dyn Dispatcher>,
        consumer: Arc<dyn MessageConsumer>,
        id_gen: IdGenerator,
    ) -> Self {
        Self(Arc::new(Inner {
            dispatcher,
            consumer,
            id_gen,
            client_requests: DashMap::new(),
            server_requests: DashMap::new(),
        }))
    }

    /// Send a notification. Never fails locally beyond consumer failures,
    /// which the host's consumer implementation is responsible for handling.
    pub async fn notify(&self, method: impl Into<String>, params: Option<Value>) {
        let method = method.into();
        debug!(%method, "sending notification");
        let notification = Notification::new(method, params);
        self.0
            .consumer
            .consume(Message::Notification(notification).into_value())
            .await;
    }

    /// Send a request and return a future that resolves once a matching
    /// response arrives. Dropping the returned future before it resolves
    /// sends a `$/cancelRequest` notification for this id (best-effort; the
    /// remote peer decides whether to honor it). A late response to an id
    /// whose future was dropped is discarded without error.
    pub async fn request(&self, method: impl Into<String>, params: Option<Value>) -> RequestFuture {
        let method = method.into();
        let id = (self.0.id_gen)();
        debug!(%method, %id, "sending request");

        let (tx, rx) = oneshot::channel();
        self.0.server_requests.insert(id.clone(), tx);

        let request = Request::new(id.clone(), method, params);
        self.0
            .consumer
            .consume(Message::Request(request).into_value())
            .await;

        RequestFuture {
            rx,
            completed: false,
            id,
            endpoint: self.clone(),
        }
    }

    /// Route one inbound message. Never panics or propagates handler errors
    /// to the caller; malformed messages are logged and dropped.
    pub async fn consume(&self, message: Value) {
        let Some(message) = Message::from_value(message) else {
            warn!("dropping message with missing or unsupported jsonrpc version");
            return;
        };

        match message {
            Message::Notification(n) => self.handle_notification(n).await,
            Message::Response(r) => self.handle_response(r).await,
            Message::Request(r) => self.handle_request(r).await,
        }
    }

    async fn handle_notification(&self, notification: Notification) {
        if notification.method == CANCEL_METHOD {
            self.handle_cancel_notification(notification.params).await;
            return;
        }

        let Some(handler) = self.0.dispatcher.handler(&notification.method) else {
            warn!(method = %notification.method, "ignoring notification for unknown method");
            return;
        };

        let method = notification.method.clone();
        match handler.call(notification.params) {
            HandlerOutcome::Ready(Ok(_)) => {
                debug!(%method, "handled synchronous notification");
            }
            HandlerOutcome::Ready(Err(e)) => {
                warn!(%method, error = %e, "notification handler failed");
            }
            HandlerOutcome::Deferred(fut) => {
                tokio::spawn(async move {
                    match fut.await {
                        Ok(_) => debug!(%method, "handled async notification"),
                        Err(e) => warn!(%method, error = %e, "async notification handler failed"),
                    }
                });
            }
        }
    }

    async fn handle_cancel_notification(&self, params: Option<Value>) {
        let Some(id) = extract_id(params) else {
            warn!("$/cancelRequest notification missing id");
            return;
        };

        match self.0.client_requests.get(&id) {
            Some(abort) => {
                abort.abort();
                debug!(%id, "cancelled in-flight request");
            }
            None => {
                warn!(%id, "received cancel notification for unknown message id");
            }
        }
    }

    async fn handle_request(&self, request: Request) {
        let id = request.id.clone();
        let Some(handler) = self.0.dispatcher.handler(&request.method) else {
            self.respond(Response::failure(id, RpcError::method_not_found(request.method).into()))
                .await;
            return;
        };

        match handler.call(request.params) {
            HandlerOutcome::Ready(Ok(value)) => {
                self.respond(Response::success(id, value)).await;
            }
            HandlerOutcome::Ready(Err(e)) => {
                error!(method = %request.method, %id, error = %e, "request handler failed");
                self.respond(Response::failure(id, e.into())).await;
            }
            HandlerOutcome::Deferred(fut) => {
                self.track_deferred_request(id, request.method, fut).await
            }
        }
    }

    async fn track_deferred_request(
        &self,
        id: RequestId,
        method: String,
        fut: BoxFuture<Result<Value, RpcError>>,
    ) {
        let (join, abort) = spawn_cancellable(fut);
        self.0.client_requests.insert(id.clone(), abort);

        let endpoint = self.clone();
        tokio::spawn(async move {
            let outcome = join.await;
            endpoint.0.client_requests.remove(&id);

            let response = match outcome {
                Ok(Ok(value)) => Response::success(id, value),
                Ok(Err(e)) => {
                    error!(%method, %id, error = %e, "deferred request handler failed");
                    Response::failure(id, e.into())
                }
                Err(join_err) if join_err.is_cancelled() => {
                    Response::failure(id, RpcError::request_cancelled().into())
                }
                Err(join_err) => {
                    error!(%method, %id, error = %join_err, "deferred request handler panicked");
                    Response::failure(id, RpcError::internal_error(join_err).into())
                }
            };
            endpoint.respond(response).await;
        });
    }

    async fn respond(&self, response: Response) {
        self.0
            .consumer
            .consume(Message::Response(response).into_value())
            .await;
    }

    async fn handle_response(&self, response: Response) {
        let Some((_, sender)) = self.0.server_requests.remove(&response.id) else {
            warn!(id = %response.id, "received response to unknown message id");
            return;
        };

        let outcome = match response.error {
            Some(err) => Err(RpcError::from(err)),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        // The receiver may already be gone if the caller dropped the future
        // concurrently with the response arriving; that race is harmless.
        let _ = sender.send(outcome);
    }

    /// Cancel every outstanding inbound and outbound request. Outbound
    /// futures resolve as cancelled; inbound tasks are aborted (best-effort).
    pub fn shutdown(&self) {
        for entry in self.0.client_requests.iter() {
            entry.value().abort();
        }
        self.0.client_requests.clear();
        self.0.server_requests.clear();
    }
}

fn extract_id(params: Option<Value>) -> Option<RequestId> {
    let params = params?;
    let id = params.get("id")?.clone();
    serde_json::from_value(id).ok()
}

/// The future returned by [`Endpoint::request`]. Resolves with the response
/// result or a typed error once it arrives. Dropping it before completion
/// sends `$/cancelRequest` for its id exactly once.
pub struct RequestFuture {
    rx: oneshot::Receiver<Result<Value, RpcError>>,
    completed: bool,
    id: RequestId,
    endpoint: Endpoint,
}

impl Future for RequestFuture {
    type Output = Result<Value, RpcError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => {
                self.completed = true;
                Poll::Ready(outcome)
            }
            Poll::Ready(Err(_)) => {
                self.completed = true;
                Poll::Ready(Err(RpcError::request_cancelled()))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RequestFuture {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        // Already-removed entries (e.g. after shutdown()) make this a no-op.
        if self.endpoint.0.server_requests.remove(&self.id).is_none() {
            return;
        }

        let endpoint = self.endpoint.clone();
        let id = self.id.clone();
        tokio::spawn(async move {
            endpoint.notify(CANCEL_METHOD, Some(serde_json::json!({ "id": id }))).await;
        });
    }
}
