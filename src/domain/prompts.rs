//! Prompt registry. The demo server registers none, but still advertises the
//! capability so clients can list it.

use rust_mcp_sdk::schema::Prompt;

pub fn build_prompts_list() -> Vec<Prompt> {
    vec![]
}
