//! Line-delimited stdio transport
//!
//! Each line on the reader is one JSON-RPC message (or batch); each response is
//! written back as a single line.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::mcp::rpc::{json_rpc_error, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

pub async fn serve_stdio<R, W>(state: AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(payload) => handle_json_rpc_payload(&state, payload).await,
            Err(err) => {
                debug!(error = %err, "discarding undecodable stdio frame");
                Some(json_rpc_error(None, PARSE_ERROR, "Parse error"))
            }
        };

        if let Some(response) = response {
            let mut frame = serde_json::to_vec(&response)?;
            frame.push(b'\n');
            writer.write_all(&frame).await?;
            writer.flush().await?;
        }
    }

    info!("stdin closed, stopping stdio transport");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{duplex, AsyncReadExt, BufReader};

    use super::*;
    use crate::mcp::rpc::INVALID_REQUEST;

    async fn run(input: &str) -> Vec<Value> {
        let (mut client, server) = duplex(64 * 1024);
        let (mut output_rx, output_tx) = duplex(64 * 1024);
        client
            .write_all(input.as_bytes())
            .await
            .expect("write input");
        drop(client);

        serve_stdio(
            AppState::new(None, "Demo".to_string()),
            BufReader::new(server),
            output_tx,
        )
        .await
        .expect("stdio loop");

        let mut output = String::new();
        output_rx
            .read_to_string(&mut output)
            .await
            .expect("read output");
        output
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn answers_requests_and_skips_notifications() {
        let responses = run(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add","arguments":{"a":1,"b":2}}}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(responses[0]["result"], json!({}));
        assert_eq!(responses[1]["id"], json!(2));
        assert_eq!(responses[1]["result"]["structuredContent"]["result"], json!(3));
    }

    #[tokio::test]
    async fn undecodable_line_yields_parse_error() {
        let responses = run("{not json\n").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], json!(PARSE_ERROR));
        assert_eq!(responses[0].get("id"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn null_id_request_is_answered_with_invalid_request() {
        let responses = run(concat!(
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], json!(INVALID_REQUEST));
        assert_eq!(responses[0].get("id"), Some(&Value::Null));
        assert_eq!(responses[1]["id"], json!(3));
    }

    #[tokio::test]
    async fn batch_returns_array_of_request_responses() {
        let responses = run(concat!(
            r#"[{"jsonrpc":"2.0","id":"a","method":"ping"},{"jsonrpc":"2.0","method":"notifications/initialized"}]"#,
            "\n",
            "[]\n",
        ))
        .await;

        assert_eq!(responses.len(), 2);
        let batch = responses[0].as_array().expect("batch response");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0]["id"], json!("a"));
        assert_eq!(responses[1]["error"]["code"], json!(INVALID_REQUEST));
    }
}
