//! A bidirectional JSON-RPC 2.0 endpoint: a length-prefixed frame codec plus a
//! symmetric request/response/notification dispatcher, suitable for hosting
//! the Language Server Protocol base transport or comparable peer-to-peer RPC
//! workloads.
//!
//! The crate has two halves that compose but don't depend on each other:
//!
//! - [`frame`]: [`frame::FrameReader`]/[`frame::FrameWriter`] turn a duplex
//!   byte stream into a stream of [`serde_json::Value`] messages and back.
//! - [`Endpoint`]: routes those messages according to JSON-RPC 2.0 semantics,
//!   tracking in-flight requests in both directions and honoring
//!   `$/cancelRequest`.
//!
//! A caller wires them together by handing the `Endpoint` a [`MessageConsumer`]
//! that forwards to a [`frame::FrameWriter`], and driving a
//! [`frame::FrameReader`]'s `listen` loop with a closure that calls
//! [`Endpoint::consume`]. See `demos/lsp_host.rs` for a complete example
//! hosting a spawned LSP server subprocess.

pub mod concurrency;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod id;
pub mod message;

mod endpoint;

pub use dispatcher::{Dispatcher, Handler, HandlerOutcome, MethodMap};
pub use endpoint::{Endpoint, MessageConsumer, RequestFuture, CANCEL_METHOD};
pub use error::{ErrorObject, RpcError};
pub use id::{default_id_generator, IdGenerator};
pub use message::{Message, Notification, Request, RequestId, Response};
