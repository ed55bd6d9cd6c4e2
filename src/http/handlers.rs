//! Axum HTTP handlers for the web server
//!
//! Provides the primary Model Context Protocol endpoint, and general metadata endpoints.
//! `POST /mcp` answers with plain JSON, or with a single SSE `message` event when the
//! client accepts `text/event-stream`.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::http::SESSION_HEADER;
use crate::mcp::rpc::{is_json_rpc_error, json_rpc_error, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_payload;
use crate::{errors::AppError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
    })
}

pub async fn mcp_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let streaming = accepts_event_stream(&headers);
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return Ok(rpc_reply(
                json_rpc_error(None, PARSE_ERROR, "Parse error"),
                streaming,
            ))
        }
    };

    let opens_session = is_initialize_request(&payload);
    if !opens_session {
        require_session(&state, &headers).await?;
    }

    let Some(reply) = handle_json_rpc_payload(&state, payload).await else {
        return Ok(StatusCode::ACCEPTED.into_response());
    };

    let session_id = if opens_session && !is_json_rpc_error(&reply) {
        Some(state.sessions.create().await)
    } else {
        None
    };

    let mut response = rpc_reply(reply, streaming);
    if let Some(session_id) = session_id {
        let value = HeaderValue::from_str(&session_id).map_err(|err| {
            AppError::internal(format!("session id is not a valid header value: {err}"))
        })?;
        info!(session_id = %session_id, "session opened");
        response.headers_mut().insert(SESSION_HEADER, value);
    }

    Ok(response)
}

pub async fn close_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let session_id = session_header(&headers).ok_or_else(missing_session)?;
    if !state.sessions.remove(session_id).await {
        return Err(unknown_session(session_id));
    }

    info!(session_id = %session_id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

pub fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|media_type| media_type.trim().starts_with("text/event-stream"))
}

fn is_initialize_request(payload: &Value) -> bool {
    payload.get("method").and_then(Value::as_str) == Some("initialize")
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let session_id = session_header(headers).ok_or_else(missing_session)?;
    if !state.sessions.contains(session_id).await {
        return Err(unknown_session(session_id));
    }
    Ok(())
}

fn missing_session() -> AppError {
    AppError::bad_request("missing_session", "Mcp-Session-Id header is required")
}

fn unknown_session(session_id: &str) -> AppError {
    AppError::not_found(
        "session_not_found",
        "unknown or expired session",
        json!({ "session_id": session_id }),
    )
}

fn rpc_reply(reply: Value, streaming: bool) -> Response {
    if !streaming {
        return (StatusCode::OK, Json(reply)).into_response();
    }

    let event = Event::default().event("message").data(reply.to_string());
    Sse::new(stream::iter([Ok::<_, Infallible>(event)])).into_response()
}
