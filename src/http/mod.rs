//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the external API routing, including the base `/mcp` listener and other endpoints.

pub mod handlers;
pub mod session;

/// Header carrying the streamable HTTP session id, issued on `initialize`.
pub const SESSION_HEADER: &str = "mcp-session-id";
