//! Resource and tool method handlers
//!
//! Converts router outcomes into MCP result payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rust_mcp_sdk::schema::{
    BlobResourceContents, CallToolRequestParams, CallToolResult, ContentBlock, Implementation,
    InitializeResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    ReadResourceContent, ReadResourceRequestParams, ReadResourceResult, ServerCapabilities,
    ServerCapabilitiesResources, ServerCapabilitiesTools, SubscribeRequestParams, TextContent,
    TextResourceContents, UnsubscribeRequestParams,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_result, tool_not_found_to_json_rpc,
    INVALID_PARAMS,
};
use crate::mcp::server::negotiate_protocol_version;
use crate::router::resources::{Payload, ResourceContent};
use crate::{errors::AppError, AppState};

/// Resource subscriptions are offered; the static resource list never changes
/// after startup, so `listChanged` stays off.
pub fn handle_initialize(id: Option<Value>, params: Option<&Value>) -> Value {
    let protocol_version = match negotiate_protocol_version(params) {
        Ok(version) => version,
        Err(err) => return app_error_to_json_rpc(id, err),
    };

    let initialize_result = InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("Resource Demo Server".to_string()),
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: Some(true),
                list_changed: Some(false),
            }),
            prompts: None,
            ..Default::default()
        },
        protocol_version: protocol_version.into(),
        instructions: None,
        meta: None,
    };

    json_rpc_result(
        id,
        serde_json::to_value(initialize_result).expect("initialize result serialization"),
    )
}

pub fn list_resources(state: &AppState) -> Value {
    serde_json::to_value(ListResourcesResult {
        meta: None,
        next_cursor: None,
        resources: state.resources.list_static_resources(),
    })
    .expect("resources list result serialization")
}

pub fn list_resource_templates(state: &AppState) -> Value {
    serde_json::to_value(ListResourceTemplatesResult {
        meta: None,
        next_cursor: None,
        resource_templates: state.resources.list_templates(),
    })
    .expect("resource templates list result serialization")
}

pub fn list_tools(state: &AppState) -> Value {
    serde_json::to_value(ListToolsResult {
        meta: None,
        next_cursor: None,
        tools: state.tools.list_tools(),
    })
    .expect("tools list result serialization")
}

pub async fn handle_resources_read(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    match state.resources.read(&resource_read.uri).await {
        Ok(contents) => {
            let result = serde_json::to_value(ReadResourceResult {
                contents: contents.into_iter().map(to_read_resource_content).collect(),
                meta: None,
            })
            .expect("read resource result serialization");

            json_rpc_result(id, result)
        }
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

pub async fn handle_tools_call(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let arguments = tool_call.arguments.unwrap_or_default();
    match state.tools.call(&tool_call.name, &arguments).await {
        Ok(outcome) => json_rpc_result(
            id,
            serde_json::to_value(CallToolResult {
                content: vec![ContentBlock::from(TextContent::new(outcome.text, None, None))],
                is_error: outcome.is_error.then_some(true),
                meta: None,
                structured_content: outcome.structured,
            })
            .expect("tool call result serialization"),
        ),
        Err(AppError::NotFound { identifier, .. }) => tool_not_found_to_json_rpc(id, &identifier),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

/// Only uris the router can resolve are accepted; the resource itself is not read.
pub fn handle_resources_subscribe(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let subscribe: SubscribeRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    if let Err(err) = state.resources.resolve(&subscribe.uri) {
        return app_error_to_json_rpc(id, err);
    }

    if !state.events.subscribe(&subscribe.uri) {
        debug!(uri = %subscribe.uri, "resource already subscribed");
    }
    json_rpc_result(id, json!({}))
}

pub fn handle_resources_unsubscribe(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let unsubscribe: UnsubscribeRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    if !state.events.unsubscribe(&unsubscribe.uri) {
        debug!(uri = %unsubscribe.uri, "resource was not subscribed");
    }
    json_rpc_result(id, json!({}))
}

fn to_read_resource_content(content: ResourceContent) -> ReadResourceContent {
    match content.payload {
        Payload::Text(text) => ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some(content.mime_type),
            text,
            uri: content.uri,
        }),
        Payload::Blob(bytes) => ReadResourceContent::from(BlobResourceContents {
            blob: STANDARD.encode(bytes),
            meta: None,
            mime_type: Some(content.mime_type),
            uri: content.uri,
        }),
    }
}
