//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps internal `AppError`s onto JSON-RPC error payloads.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};
use tracing::error;

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const RESOURCE_NOT_FOUND: i32 = -32002;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::NotFound {
            identifier,
            details,
        } => json_rpc_error_with_data(
            id,
            RESOURCE_NOT_FOUND,
            "Resource not found",
            Some(json!({
                "uri": identifier,
                "details": details.unwrap_or_else(|| "no resource matches this uri".to_string()),
            })),
        ),
        AppError::BadArgument { argument, expected } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": "bad_argument",
                "message": format!("argument `{argument}` must be {expected}"),
                "details": {
                    "argument": argument,
                    "expected": expected,
                }
            })),
        ),
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::Handler {
            identifier,
            message,
        } => json_rpc_error_with_data(
            id,
            INTERNAL_ERROR,
            "Internal error",
            Some(json!({
                "uri": identifier,
                "details": message,
            })),
        ),
        AppError::Internal { code, message } => {
            error!(code, error = %message, "request failed with internal error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

/// Unknown tool names are reported like unknown methods, with the name attached.
pub fn tool_not_found_to_json_rpc(id: Option<Value>, name: &str) -> Value {
    json_rpc_error_with_data(
        id,
        METHOD_NOT_FOUND,
        "Method not found",
        Some(json!({
            "code": "tool_not_found",
            "message": "unknown tool name",
            "details": {
                "name": name,
            },
        })),
    )
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn not_found_carries_uri_and_details() {
        let response = app_error_to_json_rpc(
            Some(json!(6)),
            AppError::not_found_with_details("users://999", "user not found: 999"),
        );

        assert_eq!(response["id"], 6);
        assert_eq!(response["error"]["code"], RESOURCE_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Resource not found");
        assert_eq!(response["error"]["data"]["uri"], "users://999");
        assert_eq!(response["error"]["data"]["details"], "user not found: 999");
    }

    #[test]
    fn bad_argument_names_the_argument() {
        let response =
            app_error_to_json_rpc(Some(json!(1)), AppError::bad_argument("email", "string"));

        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(response["error"]["data"]["code"], "bad_argument");
        assert_eq!(response["error"]["data"]["details"]["argument"], "email");
        assert_eq!(response["error"]["data"]["details"]["expected"], "string");
    }

    #[test]
    fn internal_errors_hide_their_message() {
        let response = app_error_to_json_rpc(
            Some(json!("req-1")),
            AppError::internal("connection string leaked"),
        );

        assert_eq!(response["id"], "req-1");
        assert_eq!(response["error"]["code"], INTERNAL_ERROR);
        assert!(response["error"].get("data").is_none());
    }

    #[test]
    fn result_without_id_keeps_null_id() {
        let response = json_rpc_result(None, json!({ "ok": true }));

        assert_eq!(response["jsonrpc"], "2.0");
        assert!(response["id"].is_null());
        assert_eq!(response["result"]["ok"], true);
    }
}
