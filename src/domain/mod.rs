//! Capabilities registered on the demo server
//!
//! Provides the `add` tool, the `greeting://{name}` resource template and the
//! (empty) prompt registry exposed over the MCP protocol.

pub mod prompts;
pub mod resources;
pub mod tools;
