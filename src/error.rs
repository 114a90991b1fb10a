//! Typed JSON-RPC 2.0 error values, with wire round-trip.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const REQUEST_CANCELLED: i32 = -32800;
pub const SERVER_ERROR_LOW: i32 = -32099;
pub const SERVER_ERROR_HIGH: i32 = -32000;

/// Wire representation of a JSON-RPC error object: `{code, message, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A typed JSON-RPC error. Every variant maps to exactly one reserved code from
/// the taxonomy; `Other` carries any code the crate doesn't assign special
/// meaning to (including the open `ServerError` range, and truly unknown codes
/// received off the wire). Known-kind variants carry their own `message`/`data`
/// rather than collapsing to a canonical string, so that converting a wire
/// `ErrorObject` to `RpcError` and back reproduces it exactly, not just the code.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    #[error("{message}")]
    ParseError { message: String, data: Option<Value> },
    #[error("{message}")]
    InvalidRequest { message: String, data: Option<Value> },
    #[error("{message}")]
    MethodNotFound { message: String, data: Option<Value> },
    #[error("{message}")]
    InvalidParams { message: String, data: Option<Value> },
    #[error("{message}")]
    InternalError { message: String, data: Option<Value> },
    #[error("{message}")]
    RequestCancelled { message: String, data: Option<Value> },
    #[error("{message}")]
    Other {
        code: i32,
        message: String,
        data: Option<Value>,
    },
}

impl RpcError {
    pub fn method_not_found(method: impl Into<String>) -> Self {
        RpcError::MethodNotFound {
            message: format!("Method not found: {}", method.into()),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        RpcError::InvalidParams {
            message: message.into(),
            data: None,
        }
    }

    /// Construct an `InternalError` carrying a textual description of `cause`
    /// for diagnostics, mirroring `JsonRpcInternalError.of(sys.exc_info())`.
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        RpcError::InternalError {
            message: default_message(INTERNAL_ERROR).expect("known code"),
            data: Some(Value::String(cause.to_string())),
        }
    }

    /// The terminal error for an inbound request whose handler task was
    /// successfully cancelled.
    pub fn request_cancelled() -> Self {
        RpcError::RequestCancelled {
            message: default_message(REQUEST_CANCELLED).expect("known code"),
            data: None,
        }
    }

    pub fn server_error(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        debug_assert!((SERVER_ERROR_LOW..=SERVER_ERROR_HIGH).contains(&code));
        RpcError::Other {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            RpcError::ParseError { .. } => PARSE_ERROR,
            RpcError::InvalidRequest { .. } => INVALID_REQUEST,
            RpcError::MethodNotFound { .. } => METHOD_NOT_FOUND,
            RpcError::InvalidParams { .. } => INVALID_PARAMS,
            RpcError::InternalError { .. } => INTERNAL_ERROR,
            RpcError::RequestCancelled { .. } => REQUEST_CANCELLED,
            RpcError::Other { code, .. } => *code,
        }
    }
}

impl From<RpcError> for ErrorObject {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::ParseError { message, data } => ErrorObject {
                code: PARSE_ERROR,
                message,
                data,
            },
            RpcError::InvalidRequest { message, data } => ErrorObject {
                code: INVALID_REQUEST,
                message,
                data,
            },
            RpcError::MethodNotFound { message, data } => ErrorObject {
                code: METHOD_NOT_FOUND,
                message,
                data,
            },
            RpcError::InvalidParams { message, data } => ErrorObject {
                code: INVALID_PARAMS,
                message,
                data,
            },
            RpcError::InternalError { message, data } => ErrorObject {
                code: INTERNAL_ERROR,
                message,
                data,
            },
            RpcError::RequestCancelled { message, data } => ErrorObject {
                code: REQUEST_CANCELLED,
                message,
                data,
            },
            RpcError::Other {
                code,
                message,
                data,
            } => ErrorObject {
                code,
                message,
                data,
            },
        }
    }
}

impl From<ErrorObject> for RpcError {
    fn from(obj: ErrorObject) -> Self {
        match obj.code {
            PARSE_ERROR => RpcError::ParseError {
                message: obj.message,
                data: obj.data,
            },
            INVALID_REQUEST => RpcError::InvalidRequest {
                message: obj.message,
                data: obj.data,
            },
            METHOD_NOT_FOUND => RpcError::MethodNotFound {
                message: obj.message,
                data: obj.data,
            },
            INVALID_PARAMS => RpcError::InvalidParams {
                message: obj.message,
                data: obj.data,
            },
            INTERNAL_ERROR => RpcError::InternalError {
                message: obj.message,
                data: obj.data,
            },
            REQUEST_CANCELLED => RpcError::RequestCancelled {
                message: obj.message,
                data: obj.data,
            },
            code => RpcError::Other {
                code,
                message: obj.message,
                data: obj.data,
            },
        }
    }
}

/// The canonical short message for a reserved code, so that `from_wire` followed
/// by `to_wire` reproduces the exact string a peer sent for a known kind only
/// when that peer used the canonical text; callers that need byte-for-byte
/// round trip of arbitrary messages should keep the `ErrorObject` itself.
fn default_message(code: i32) -> Option<String> {
    let s = match code {
        PARSE_ERROR => "Parse error",
        INVALID_REQUEST => "Invalid Request",
        METHOD_NOT_FOUND => "Method not found",
        INVALID_PARAMS => "Invalid params",
        INTERNAL_ERROR => "Internal error",
        REQUEST_CANCELLED => "Request cancelled",
        _ => return None,
    };
    Some(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_round_trips() {
        let obj = ErrorObject {
            code: INVALID_PARAMS,
            message: "Invalid params".to_string(),
            data: None,
        };
        let err: RpcError = obj.clone().into();
        let back: ErrorObject = err.into();
        assert_eq!(obj, back);
    }

    #[test]
    fn known_code_round_trip_preserves_non_canonical_message_and_data() {
        let obj = ErrorObject {
            code: METHOD_NOT_FOUND,
            message: "no handler for foo".to_string(),
            data: Some(serde_json::json!({"method": "foo"})),
        };
        let err: RpcError = obj.clone().into();
        let back: ErrorObject = err.into();
        assert_eq!(obj, back);
    }

    #[test]
    fn request_cancelled_round_trip_preserves_message_and_data() {
        let obj = ErrorObject {
            code: REQUEST_CANCELLED,
            message: "operation aborted by user".to_string(),
            data: Some(serde_json::json!({"reason": "timeout"})),
        };
        let err: RpcError = obj.clone().into();
        let back: ErrorObject = err.into();
        assert_eq!(obj, back);
    }

    #[test]
    fn unknown_code_preserved() {
        let obj = ErrorObject {
            code: -32050,
            message: "custom".to_string(),
            data: Some(serde_json::json!({"x": 1})),
        };
        let err: RpcError = obj.clone().into();
        assert!(matches!(err, RpcError::Other { code: -32050, .. }));
        let back: ErrorObject = err.into();
        assert_eq!(obj, back);
    }

    #[test]
    fn internal_error_carries_cause() {
        let err = RpcError::internal_error("boom: index out of range");
        let obj: ErrorObject = err.into();
        assert_eq!(obj.code, INTERNAL_ERROR);
        assert_eq!(obj.data, Some(Value::String("boom: index out of range".into())));
    }
}
