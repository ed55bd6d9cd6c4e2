//! Model Context Protocol resource providers
//!
//! The server has no concrete resources. It exposes one URI template,
//! `greeting://{name}`, whose reads produce a personalized greeting.

use rust_mcp_sdk::schema::{
    ReadResourceContent, ReadResourceRequestParams, ReadResourceResult, Resource,
    ResourceTemplate, TextResourceContents,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::mcp::rpc::{app_error_to_json_rpc, json_rpc_error, json_rpc_result, INVALID_PARAMS};

pub const GREETING_SCHEME: &str = "greeting://";
pub const GREETING_URI_TEMPLATE: &str = "greeting://{name}";
pub const GREETING_TEMPLATE_NAME: &str = "get_greeting";
pub const GREETING_MIME_TYPE: &str = "text/plain";

pub fn build_resources_list() -> Vec<Resource> {
    vec![]
}

pub fn build_resource_templates_list() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        annotations: None,
        description: Some("Get a personalized greeting".to_string()),
        icons: vec![],
        meta: None,
        mime_type: Some(GREETING_MIME_TYPE.to_string()),
        name: GREETING_TEMPLATE_NAME.to_string(),
        title: None,
        uri_template: GREETING_URI_TEMPLATE.to_string(),
    }]
}

/// Extracts `name` from `greeting://{name}`. The name must be non-empty and
/// a single path segment with no query or fragment.
pub fn parse_greeting_uri(uri: &str) -> Option<&str> {
    uri.strip_prefix(GREETING_SCHEME).filter(|name| {
        !name.is_empty() && !name.contains(|c| matches!(c, '/' | '?' | '#'))
    })
}

pub fn greeting(name: &str) -> String {
    format!("Hello, {name}!")
}

pub fn read_resource(uri: &str) -> Result<ReadResourceResult, AppError> {
    let Some(name) = parse_greeting_uri(uri) else {
        return Err(AppError::not_found(
            "resource_not_found",
            "unknown resource uri",
            json!({ "uri": uri }),
        ));
    };

    Ok(ReadResourceResult {
        contents: vec![ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some(GREETING_MIME_TYPE.to_string()),
            text: greeting(name),
            uri: uri.to_string(),
        })],
        meta: None,
    })
}

pub async fn handle_resources_read(id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    match read_resource(&resource_read.uri) {
        Ok(result) => json_rpc_result(
            id,
            serde_json::to_value(result).expect("read resource result serialization"),
        ),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_formats_name() {
        assert_eq!(greeting("World"), "Hello, World!");
        assert_eq!(greeting(""), "Hello, !");
        assert_eq!(greeting("Ünïcødé"), "Hello, Ünïcødé!");
    }

    #[test]
    fn parses_single_segment_names_only() {
        assert_eq!(parse_greeting_uri("greeting://alice"), Some("alice"));
        assert_eq!(parse_greeting_uri("greeting://bob%20smith"), Some("bob%20smith"));
        assert_eq!(parse_greeting_uri("greeting://"), None);
        assert_eq!(parse_greeting_uri("greeting://a/b"), None);
        assert_eq!(parse_greeting_uri("farewell://alice"), None);
    }

    #[test]
    fn query_and_fragment_are_not_part_of_the_name() {
        assert_eq!(parse_greeting_uri("greeting://alice?lang=fr"), None);
        assert_eq!(parse_greeting_uri("greeting://alice#top"), None);
        assert_eq!(parse_greeting_uri("greeting://?"), None);

        let error = read_resource("greeting://alice?x=1").expect_err("query is rejected");
        assert!(matches!(
            error,
            AppError::NotFound {
                code: "resource_not_found",
                ..
            }
        ));
    }

    #[test]
    fn read_resource_returns_plain_text_greeting() {
        let result = read_resource("greeting://alice").expect("greeting should resolve");
        let value = serde_json::to_value(result).expect("result serialization");

        assert_eq!(value["contents"][0]["uri"], json!("greeting://alice"));
        assert_eq!(value["contents"][0]["mimeType"], json!("text/plain"));
        assert_eq!(value["contents"][0]["text"], json!("Hello, alice!"));
    }

    #[test]
    fn read_resource_unknown_uri_is_not_found() {
        let error = read_resource("resource://services/snapshot").expect_err("unknown uri");
        assert!(matches!(
            error,
            AppError::NotFound {
                code: "resource_not_found",
                ..
            }
        ));
    }

    #[test]
    fn template_list_advertises_greeting() {
        let templates = build_resource_templates_list();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].uri_template, "greeting://{name}");
        assert_eq!(templates[0].name, "get_greeting");
        assert_eq!(templates[0].mime_type.as_deref(), Some("text/plain"));
        assert!(build_resources_list().is_empty());

        let value = serde_json::to_value(&templates[0]).expect("template serialization");
        assert_eq!(value["uriTemplate"], json!("greeting://{name}"));
        assert_eq!(value["mimeType"], json!("text/plain"));
    }

    #[tokio::test]
    async fn read_without_params_is_invalid_params() {
        let response = handle_resources_read(Some(json!(1)), None).await;
        assert_eq!(response["error"]["code"], json!(-32602));
    }
}
