//! Callable tools exposed via Model Context Protocol
//!
//! The server registers a single tool, `add`, which sums two integers.

use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::AppError;
use crate::mcp::rpc::{app_error_to_json_rpc, json_rpc_error, json_rpc_result, INVALID_PARAMS};

#[macros::mcp_tool(name = "add", description = "Add two numbers")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct AddTool {
    pub a: i64,
    pub b: i64,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![AddTool::tool()]
}

/// `None` when the sum does not fit in an `i64`.
pub fn add(a: i64, b: i64) -> Option<i64> {
    a.checked_add(b)
}

pub fn call_add(arguments: Option<Map<String, Value>>) -> Result<CallToolResult, AppError> {
    let AddTool { a, b } = serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|_| {
            AppError::bad_request(
                "invalid_arguments",
                "add requires integer arguments a and b",
            )
        })?;

    let result = match add(a, b) {
        Some(sum) => CallToolResult {
            content: vec![ContentBlock::from(TextContent::new(
                sum.to_string(),
                None,
                None,
            ))],
            is_error: None,
            meta: None,
            structured_content: Some(Map::from_iter([("result".to_string(), json!(sum))])),
        },
        None => CallToolResult {
            content: vec![ContentBlock::from(TextContent::new(
                "integer overflow adding a and b".to_string(),
                None,
                None,
            ))],
            is_error: Some(true),
            meta: None,
            structured_content: None,
        },
    };

    Ok(result)
}

pub async fn handle_tools_call(id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let outcome = match tool_call.name.as_str() {
        "add" => call_add(tool_call.arguments),
        _ => Err(AppError::not_found(
            "tool_not_found",
            "unknown tool name",
            json!({ "name": tool_call.name }),
        )),
    };

    match outcome {
        Ok(result) => json_rpc_result(
            id,
            serde_json::to_value(result).expect("tool result serialization"),
        ),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arguments(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    #[test]
    fn add_sums_integers() {
        assert_eq!(add(2, 3), Some(5));
        assert_eq!(add(-7, 7), Some(0));
        assert_eq!(add(i64::MIN, i64::MAX), Some(-1));
    }

    #[test]
    fn add_reports_overflow() {
        assert_eq!(add(i64::MAX, 1), None);
        assert_eq!(add(i64::MIN, -1), None);
    }

    #[test]
    fn tool_list_contains_add_with_integer_schema() {
        let tools = build_tools_list();
        assert_eq!(tools.len(), 1);

        let tool = serde_json::to_value(&tools[0]).expect("tool serialization");
        assert_eq!(tool["name"], json!("add"));
        assert_eq!(tool["description"], json!("Add two numbers"));
        assert_eq!(tool["inputSchema"]["properties"]["a"]["type"], json!("integer"));
        assert_eq!(tool["inputSchema"]["properties"]["b"]["type"], json!("integer"));
    }

    #[test]
    fn call_add_returns_text_and_structured_content() {
        let result = call_add(arguments(json!({ "a": 40, "b": 2 }))).expect("add should succeed");
        let value = serde_json::to_value(result).expect("result serialization");

        assert_eq!(value["content"][0]["text"], json!("42"));
        assert_eq!(value["structuredContent"]["result"], json!(42));
        assert!(value.get("isError").map_or(true, Value::is_null));
    }

    #[test]
    fn call_add_overflow_is_tool_error() {
        let result = call_add(arguments(json!({ "a": i64::MAX, "b": 1 })))
            .expect("overflow is reported in the result");

        assert_eq!(result.is_error, Some(true));
        assert!(result.structured_content.is_none());
    }

    #[test]
    fn call_add_rejects_missing_or_non_integer_arguments() {
        for args in [
            json!({ "a": 1 }),
            json!({ "a": "1", "b": 2 }),
            json!({ "a": 1.5, "b": 2 }),
            json!({}),
        ] {
            let error = call_add(arguments(args)).expect_err("expected invalid arguments");
            assert!(error.to_string().contains("bad request"));
        }

        let error = call_add(None).expect_err("expected invalid arguments");
        assert!(matches!(error, AppError::BadRequest { code: "invalid_arguments", .. }));
    }

    #[tokio::test]
    async fn unknown_tool_returns_tool_not_found_data() {
        let response = handle_tools_call(
            Some(json!(3)),
            Some(json!({ "name": "multiply", "arguments": { "a": 1, "b": 2 } })),
        )
        .await;

        assert_eq!(response["error"]["code"], json!(-32601));
        assert_eq!(response["error"]["data"]["code"], json!("tool_not_found"));
        assert_eq!(response["error"]["data"]["details"]["name"], json!("multiply"));
    }
}
