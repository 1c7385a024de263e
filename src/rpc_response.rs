// src/rpc_response.rs

use crate::error::error_codes;
use crate::rpc_client::JSONRPC_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope returned to inbound `currentPrice` callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: impl Into<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn internal() -> Self {
        Self::new(error_codes::INTERNAL_ERROR, "Internal error")
    }

    pub fn parse_error() -> Self {
        Self::new(error_codes::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request() -> Self {
        Self::new(error_codes::INVALID_REQUEST, "Invalid Request")
    }

    pub fn method_not_found() -> Self {
        Self::new(error_codes::METHOD_NOT_FOUND, "Method not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_has_no_error_member() {
        let response = JsonRpcResponse::success(json!(1), "30.00000000");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "jsonrpc": "2.0", "id": 1, "result": "30.00000000" })
        );
    }

    #[test]
    fn failure_omits_result_and_empty_data() {
        let response = JsonRpcResponse::failure(json!("abc"), JsonRpcErrorObject::internal());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "jsonrpc": "2.0", "id": "abc", "error": { "code": -32603, "message": "Internal error" } })
        );
    }

    #[test]
    fn dispatcher_errors_use_standard_codes() {
        assert_eq!(JsonRpcErrorObject::parse_error().code, -32700);
        assert_eq!(JsonRpcErrorObject::invalid_request().code, -32600);
        assert_eq!(JsonRpcErrorObject::method_not_found().code, -32601);
    }
}
