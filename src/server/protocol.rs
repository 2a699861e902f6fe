//! JSON-RPC protocol types for the DRC server

use serde::{Deserialize, Serialize};

/// JSON-RPC Request format
#[derive(Debug, Deserialize)]
pub struct Request {
    pub id: Option<serde_json::Value>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC Response format
#[derive(Debug, Serialize)]
pub struct Response {
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// JSON-RPC Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
}

/// Server-initiated message with no request id
#[derive(Debug, Serialize)]
pub struct Notification {
    pub id: Option<serde_json::Value>,
    pub method: String,
    pub result: serde_json::Value,
}

impl Response {
    /// Create a success response with a JSON value
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Response {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<serde_json::Value>, code: i32, message: String) -> Self {
        Response {
            id,
            result: None,
            error: Some(ErrorResponse { code, message }),
        }
    }

    /// Success when the handler produced a value, internal error otherwise
    pub fn from_result(id: Option<serde_json::Value>, result: anyhow::Result<serde_json::Value>, code: i32) -> Self {
        match result {
            Ok(value) => Response::success(id, value),
            Err(e) => Response::error(id, code, format!("{:#}", e)),
        }
    }
}

impl Notification {
    pub fn new(method: &str, result: serde_json::Value) -> Self {
        Notification { id: None, method: method.to_string(), result }
    }
}

/// Serialize a message to one output line. Falls back to a hand-built
/// internal error when the payload itself cannot be serialized.
pub fn to_line<T: Serialize>(message: &T) -> String {
    serde_json::to_string(message).unwrap_or_else(|e| {
        let fallback = Response::error(None, error_codes::INTERNAL_ERROR, format!("Serialization failed: {}", e));
        serde_json::to_string(&fallback).unwrap_or_default()
    })
}

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Custom error codes
    pub const LOAD_FAILED: i32 = 1;
    pub const NO_BOARD_LOADED: i32 = 2;
    pub const DRC_BUSY: i32 = 3;
    pub const NO_DRC_RESULTS: i32 = 4;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_response_omits_result() {
        let line = to_line(&Response::error(Some(json!(7)), error_codes::METHOD_NOT_FOUND, "nope".to_string()));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["error"]["code"], json!(-32601));
        assert!(value.get("result").is_none(), "line: {}", line);
    }

    #[test]
    fn test_from_result_keeps_error_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let resp = Response::from_result(None, Err(err), error_codes::LOAD_FAILED);
        let error = resp.error.unwrap();
        assert_eq!(error.code, error_codes::LOAD_FAILED);
        assert_eq!(error.message, "outer: inner");
    }

    #[test]
    fn test_request_without_params() {
        let req: Request = serde_json::from_str(r#"{"id": 1, "method": "RunDRC"}"#).unwrap();
        assert_eq!(req.method, "RunDRC");
        assert!(req.params.is_none());
    }
}
