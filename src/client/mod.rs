//! Model Context Protocol client session
//!
//! Wraps a transport with request id allocation, the `initialize` handshake and
//! typed helpers for the listing and invocation methods.

pub mod error;
pub mod transport;

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};

use rust_mcp_sdk::schema::{
    CallToolResult, InitializeResult, ListPromptsResult, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, Prompt, ReadResourceResult, Resource, ResourceTemplate,
    Tool,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

pub use error::ClientError;
pub use transport::{ChildProcessTransport, HttpTransport, InProcessTransport, McpTransport};

use crate::mcp::server::SUPPORTED_PROTOCOL_VERSION;

pub const ACCEPTED_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];

/// Everything a server advertises, gathered in one pass.
#[derive(Debug, Clone)]
pub struct CapabilityListing {
    pub prompts: Vec<Prompt>,
    pub resources: Vec<Resource>,
    pub resource_templates: Vec<ResourceTemplate>,
    pub tools: Vec<Tool>,
}

pub struct ClientSession<T: McpTransport> {
    transport: T,
    next_id: AtomicI64,
    server: Option<InitializeResult>,
}

impl<T: McpTransport> ClientSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicI64::new(1),
            server: None,
        }
    }

    pub fn server(&self) -> Option<&InitializeResult> {
        self.server.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn initialize(&mut self) -> Result<&InitializeResult, ClientError> {
        let result: InitializeResult = self
            .send_request(
                "initialize",
                Some(json!({
                    "protocolVersion": SUPPORTED_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                })),
            )
            .await?;

        if !ACCEPTED_PROTOCOL_VERSIONS.contains(&result.protocol_version.as_str()) {
            return Err(ClientError::protocol(format!(
                "unsupported protocol version {}",
                result.protocol_version
            )));
        }

        self.notify("notifications/initialized", None).await?;
        info!(
            server = %result.server_info.name,
            version = %result.server_info.version,
            protocol_version = %result.protocol_version,
            "session initialized"
        );

        Ok(&*self.server.insert(result))
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        let _: Value = self.request("ping", None).await?;
        Ok(())
    }

    pub async fn list_prompts(
        &self,
        cursor: Option<String>,
    ) -> Result<ListPromptsResult, ClientError> {
        self.request("prompts/list", cursor_params(cursor)).await
    }

    pub async fn list_resources(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourcesResult, ClientError> {
        self.request("resources/list", cursor_params(cursor)).await
    }

    pub async fn list_resource_templates(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourceTemplatesResult, ClientError> {
        self.request("resources/templates/list", cursor_params(cursor))
            .await
    }

    pub async fn list_tools(&self, cursor: Option<String>) -> Result<ListToolsResult, ClientError> {
        self.request("tools/list", cursor_params(cursor)).await
    }

    pub async fn list_all_prompts(&self) -> Result<Vec<Prompt>, ClientError> {
        self.collect_pages("prompts/list", |page: ListPromptsResult| {
            (page.prompts, page.next_cursor)
        })
        .await
    }

    pub async fn list_all_resources(&self) -> Result<Vec<Resource>, ClientError> {
        self.collect_pages("resources/list", |page: ListResourcesResult| {
            (page.resources, page.next_cursor)
        })
        .await
    }

    pub async fn list_all_resource_templates(&self) -> Result<Vec<ResourceTemplate>, ClientError> {
        self.collect_pages(
            "resources/templates/list",
            |page: ListResourceTemplatesResult| (page.resource_templates, page.next_cursor),
        )
        .await
    }

    pub async fn list_all_tools(&self) -> Result<Vec<Tool>, ClientError> {
        self.collect_pages("tools/list", |page: ListToolsResult| {
            (page.tools, page.next_cursor)
        })
        .await
    }

    pub async fn list_capabilities(&self) -> Result<CapabilityListing, ClientError> {
        Ok(CapabilityListing {
            prompts: self.list_all_prompts().await?,
            resources: self.list_all_resources().await?,
            resource_templates: self.list_all_resource_templates().await?,
            tools: self.list_all_tools().await?,
        })
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, ClientError> {
        self.request(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ClientError> {
        self.request("resources/read", Some(json!({ "uri": uri })))
            .await
    }

    /// Ends the session, then releases the transport underneath it.
    pub async fn close(mut self) -> Result<(), ClientError> {
        if self.server.take().is_some() {
            debug!("closing MCP session");
        }
        self.transport.close().await
    }

    /// Follows `nextCursor` until the server stops sending one. A cursor the
    /// server already handed out ends the walk with a protocol error.
    async fn collect_pages<P, I>(
        &self,
        method: &str,
        split: impl Fn(P) -> (Vec<I>, Option<String>),
    ) -> Result<Vec<I>, ClientError>
    where
        P: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut cursor = None;
        loop {
            let page: P = self.request(method, cursor_params(cursor)).await?;
            let (page_items, next_cursor) = split(page);
            items.extend(page_items);

            let Some(next) = next_cursor else {
                return Ok(items);
            };
            if !seen_cursors.insert(next.clone()) {
                return Err(ClientError::protocol(format!(
                    "{method} repeated cursor {next:?}"
                )));
            }
            debug!(method = %method, cursor = %next, "fetching next page");
            cursor = Some(next);
        }
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<R, ClientError> {
        if self.server.is_none() {
            return Err(ClientError::NotInitialized);
        }
        self.send_request(method, params).await
    }

    async fn send_request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<R, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut message = json!({ "jsonrpc": "2.0", "id": id, "method": method });
        if let Some(params) = params {
            message["params"] = params;
        }

        let response = self
            .transport
            .send(message)
            .await?
            .ok_or_else(|| ClientError::protocol(format!("no response to {method}")))?;

        if response.get("id") != Some(&json!(id)) {
            return Err(ClientError::protocol(format!(
                "response id does not match request {id}"
            )));
        }

        if let Some(error) = response.get("error") {
            return Err(ClientError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                data: error.get("data").cloned(),
            });
        }

        let result = response
            .get("result")
            .cloned()
            .ok_or_else(|| ClientError::protocol(format!("{method} response has no result")))?;
        Ok(serde_json::from_value(result)?)
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        let mut message = json!({ "jsonrpc": "2.0", "method": method });
        if let Some(params) = params {
            message["params"] = params;
        }
        self.transport.send(message).await?;
        Ok(())
    }
}

fn cursor_params(cursor: Option<String>) -> Option<Value> {
    cursor.map(|cursor| json!({ "cursor": cursor }))
}
