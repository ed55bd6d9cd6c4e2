//! Client-side transports
//!
//! A transport moves one JSON-RPC message to the server and, for requests,
//! hands back the matching response.

use std::process::Stdio;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    process::{Child, ChildStdin, ChildStdout, Command},
    sync::Mutex,
};
use tracing::{debug, info};

use crate::client::error::ClientError;
use crate::http::SESSION_HEADER;
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Requests yield `Some(response)`, notifications yield `None`.
    async fn send(&self, message: Value) -> Result<Option<Value>, ClientError>;

    async fn close(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// POSTs each message to the server's `/mcp` endpoint.
///
/// Accepts both JSON and single-event SSE replies, and carries the
/// `Mcp-Session-Id` the server hands out on `initialize`.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    session_id: Mutex<Option<String>>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_token: None,
            session_id: Mutex::new(None),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session_id.lock().await.clone()
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn send(&self, message: Value) -> Result<Option<Value>, ClientError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json, text/event-stream")
            .json(&message);
        if let Some(session_id) = self.session_id.lock().await.as_deref() {
            request = request.header(SESSION_HEADER, session_id);
        }

        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            debug!(session_id = %session_id, "server assigned session");
            *self.session_id.lock().await = Some(session_id.to_string());
        }

        if status == StatusCode::NO_CONTENT || status == StatusCode::ACCEPTED {
            return Ok(None);
        }

        let is_event_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));
        if is_event_stream {
            let body = response.text().await?;
            return parse_sse_message(&body).map(Some);
        }

        Ok(Some(response.json::<Value>().await?))
    }

    /// Ends the server-side session, if one was opened.
    async fn close(&self) -> Result<(), ClientError> {
        let Some(session_id) = self.session_id.lock().await.take() else {
            return Ok(());
        };

        let request = self
            .client
            .delete(&self.endpoint)
            .header(SESSION_HEADER, session_id.as_str());
        let status = self.authorize(request).send().await?.status();
        // 405 means the server does not let clients end sessions.
        if status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED {
            info!(session_id = %session_id, "session closed");
            return Ok(());
        }

        Err(ClientError::Status {
            status: status.as_u16(),
        })
    }
}

/// Returns the data of the first `message` event in an SSE body.
pub fn parse_sse_message(body: &str) -> Result<Value, ClientError> {
    for block in body.split("\n\n") {
        let mut event = "message";
        let mut data = Vec::new();
        for line in block.lines() {
            if let Some(value) = line.strip_prefix("event:") {
                event = value.trim();
            } else if let Some(value) = line.strip_prefix("data:") {
                data.push(value.strip_prefix(' ').unwrap_or(value));
            }
        }

        if event == "message" && !data.is_empty() {
            return Ok(serde_json::from_str(&data.join("\n"))?);
        }
    }

    Err(ClientError::protocol("event stream carried no message event"))
}

struct ChildIo {
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// Spawns a server process and speaks newline-delimited JSON over its stdio.
/// The child is killed if the transport is dropped without `close`.
pub struct ChildProcessTransport {
    child: Mutex<Child>,
    io: Mutex<ChildIo>,
}

impl ChildProcessTransport {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, ClientError> {
        info!(program = %program, ?args, "starting MCP server process");
        let mut command = Command::new(program);
        command.args(args);
        Self::from_command(command)
    }

    /// Takes over stdio of `command`; any env or cwd set on it is kept.
    pub fn from_command(mut command: Command) -> Result<Self, ClientError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::protocol("child stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::protocol("child stdout was not captured"))?;

        Ok(Self {
            child: Mutex::new(child),
            io: Mutex::new(ChildIo {
                stdin: Some(stdin),
                stdout: BufReader::new(stdout).lines(),
            }),
        })
    }
}

#[async_trait]
impl McpTransport for ChildProcessTransport {
    async fn send(&self, message: Value) -> Result<Option<Value>, ClientError> {
        let mut guard = self.io.lock().await;
        let ChildIo { stdin, stdout } = &mut *guard;
        let stdin = stdin.as_mut().ok_or(ClientError::Closed)?;

        let mut frame = serde_json::to_vec(&message)?;
        frame.push(b'\n');
        stdin.write_all(&frame).await?;
        stdin.flush().await?;

        let Some(expected_id) = message.get("id").cloned() else {
            return Ok(None);
        };

        while let Some(line) = stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line)?;
            let is_response = value.get("result").is_some() || value.get("error").is_some();
            if is_response && value.get("id") == Some(&expected_id) {
                return Ok(Some(value));
            }
            debug!(frame = %value, "skipping unrelated server message");
        }

        Err(ClientError::Closed)
    }

    async fn close(&self) -> Result<(), ClientError> {
        // Dropping stdin sends EOF, which ends the server's read loop.
        self.io.lock().await.stdin.take();
        let status = self.child.lock().await.wait().await?;
        info!(%status, "MCP server process exited");
        Ok(())
    }
}

/// Routes messages straight into a server state in the same process.
#[derive(Clone)]
pub struct InProcessTransport {
    state: AppState,
}

impl InProcessTransport {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl McpTransport for InProcessTransport {
    async fn send(&self, message: Value) -> Result<Option<Value>, ClientError> {
        Ok(handle_json_rpc_payload(&self.state, message).await)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sse_message_data_is_decoded() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n";
        let value = parse_sse_message(body).expect("message event");
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["result"], json!({}));
    }

    #[test]
    fn sse_skips_other_events_and_joins_data_lines() {
        let body = concat!(
            ": keep-alive\n\n",
            "event: endpoint\ndata: /mcp\n\n",
            "data: {\"id\":2,\n",
            "data: \"result\":{}}\n\n",
        );
        let value = parse_sse_message(body).expect("message event");
        assert_eq!(value["id"], json!(2));
    }

    #[test]
    fn sse_without_message_is_protocol_error() {
        let error = parse_sse_message("event: endpoint\ndata: /mcp\n\n")
            .expect_err("no message event");
        assert!(matches!(error, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn http_transport_starts_without_session() {
        let transport = HttpTransport::new("http://127.0.0.1:9/mcp");
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/mcp");
        assert!(transport.session_id().await.is_none());
        transport.close().await.expect("nothing to close");
    }
}
