//! The central Model Context Protocol engine
//!
//! Decodes JSON-RPC messages, negotiates `initialize`, and routes resource and
//! tool methods onto the router.

use std::time::Instant;

use rust_mcp_sdk::schema::{
    CallToolRequest, InitializeRequest, JsonrpcMessage, JsonrpcRequest,
    ListResourceTemplatesRequest, ListResourcesRequest, ListToolsRequest, PingRequest,
    ProtocolVersion, ReadResourceRequest, SubscribeRequest, UnsubscribeRequest,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::logging::audit_mcp_action;
use crate::mcp::methods::{
    handle_initialize, handle_resources_read, handle_resources_subscribe,
    handle_resources_unsubscribe, handle_tools_call, list_resource_templates, list_resources,
    list_tools,
};
use crate::mcp::rpc::{
    is_json_rpc_error, json_rpc_error, json_rpc_result, request_id_to_value, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND,
};
use crate::{errors::AppError, AppState};

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";

/// Handles one decoded payload, which may be a single message or a batch.
/// Returns `None` when nothing should be written back.
pub async fn handle_json_rpc_payload(state: &AppState, payload: Value) -> Option<Value> {
    let Some(batch) = payload.as_array() else {
        return handle_json_rpc_value(state, payload).await;
    };

    if batch.is_empty() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let mut responses = Vec::new();
    for item in batch {
        if let Some(response) = handle_json_rpc_value(state, item.clone()).await {
            responses.push(response);
        }
    }

    if responses.is_empty() {
        None
    } else {
        Some(Value::Array(responses))
    }
}

pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(
                    Some(request_id),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }

            Some(
                handle_json_rpc_request(
                    state,
                    Some(request_id),
                    request.method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            debug!(method = %notification.method, "notification received");
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => Some(
            json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"),
        ),
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let payload = serde_json::to_value(request).expect("jsonrpc request serialization");
    let request_id = Some(request_id_to_value(request.id.clone()));

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "resources/read" => serde_json::from_value::<ReadResourceRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "resources/list" => serde_json::from_value::<ListResourcesRequest>(payload).is_ok(),
        "resources/templates/list" => {
            serde_json::from_value::<ListResourceTemplatesRequest>(payload).is_ok()
        }
        "resources/subscribe" => serde_json::from_value::<SubscribeRequest>(payload).is_ok(),
        "resources/unsubscribe" => serde_json::from_value::<UnsubscribeRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let started_at = Instant::now();
    let subject = audit_subject(params.as_ref());

    let response = match method.as_str() {
        "initialize" => handle_initialize(id, params.as_ref()),
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => json_rpc_result(id, list_tools(state)),
        "tools/call" => handle_tools_call(state, id, params).await,
        "resources/list" => json_rpc_result(id, list_resources(state)),
        "resources/templates/list" => json_rpc_result(id, list_resource_templates(state)),
        "resources/read" => handle_resources_read(state, id, params).await,
        "resources/subscribe" => handle_resources_subscribe(state, id, params),
        "resources/unsubscribe" => handle_resources_unsubscribe(state, id, params),
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    audit_mcp_action(
        &method,
        subject.as_deref(),
        is_json_rpc_error(&response),
        started_at,
    );

    response
}

/// Any non-empty offered version is answered with the one version this server
/// speaks; the client decides whether it can continue.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<ProtocolVersion, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    if offered_version != SUPPORTED_PROTOCOL_VERSION {
        debug!(
            offered = offered_version,
            supported = SUPPORTED_PROTOCOL_VERSION,
            "client offered a different protocol version"
        );
    }

    Ok(ProtocolVersion::V2024_11_05)
}

/// The resource uri or tool name a request acts on, for audit logs.
pub fn audit_subject(params: Option<&Value>) -> Option<String> {
    let object = params?.as_object()?;
    object
        .get("uri")
        .or_else(|| object.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
