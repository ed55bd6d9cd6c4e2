use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transport i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server answered with HTTP status {status}")]
    Status { status: u16 },
    #[error("json-rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("session is not initialized")]
    NotInitialized,
    #[error("transport is closed")]
    Closed,
}

impl ClientError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
