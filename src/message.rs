//! JSON-RPC 2.0 message shapes.
//!
//! A message is discriminated structurally (presence of `id`/`method`), not by a
//! tag field, mirroring how the wire protocol itself distinguishes notifications,
//! requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorObject;

pub const JSONRPC_VERSION: &str = "2.0";

/// Id carried by requests/responses. JSON-RPC allows either shape; whichever one
/// a peer sent is preserved verbatim when replying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: RequestId, error: ErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A decoded inbound (or outbound) message, shape-matched the way the Python
/// original inspects `'id' in message` / `'method' in message`.
#[derive(Debug, Clone)]
pub enum Message {
    Notification(Notification),
    Request(Request),
    Response(Response),
}

impl Message {
    /// Parse a raw JSON value into one of the three message shapes.
    ///
    /// Returns `None` if `jsonrpc` is missing or not `"2.0"` — the caller logs and
    /// drops the message, per the endpoint's `consume` validation step.
    pub fn from_value(value: Value) -> Option<Message> {
        let obj = value.as_object()?;

        match obj.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            _ => return None,
        }

        let has_id = obj.contains_key("id");
        let has_method = obj.contains_key("method");

        if !has_id && has_method {
            serde_json::from_value(value).ok().map(Message::Notification)
        } else if has_id && !has_method {
            serde_json::from_value(value).ok().map(Message::Response)
        } else if has_id && has_method {
            serde_json::from_value(value).ok().map(Message::Request)
        } else {
            None
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Message::Notification(n) => serde_json::to_value(n).unwrap_or(Value::Null),
            Message::Request(r) => serde_json::to_value(r).unwrap_or(Value::Null),
            Message::Response(r) => serde_json::to_value(r).unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_round_trips() {
        let v = json!({"jsonrpc": "2.0", "id": "hello", "method": "method", "params": {}});
        let msg = Message::from_value(v.clone()).expect("parses");
        let back = msg.into_value();
        assert_eq!(back, v);
    }

    #[test]
    fn notification_has_no_id() {
        let v = json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {"id": "x"}});
        match Message::from_value(v).unwrap() {
            Message::Notification(n) => assert_eq!(n.method, "$/cancelRequest"),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn response_has_no_method() {
        let v = json!({"jsonrpc": "2.0", "id": "id", "result": 1234});
        match Message::from_value(v).unwrap() {
            Message::Response(r) => assert_eq!(r.result, Some(json!(1234))),
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn wrong_version_is_rejected() {
        let v = json!({"jsonrpc": "1.0", "method": "m"});
        assert!(Message::from_value(v).is_none());
    }

    #[test]
    fn missing_version_is_rejected() {
        let v = json!({"method": "m"});
        assert!(Message::from_value(v).is_none());
    }
}
