//! Connects to a running demo server, initializes a session and prints the
//! prompts, resources, resource templates and tools it advertises.

use demo_mcp::{
    client::{ChildProcessTransport, ClientError, ClientSession, HttpTransport, McpTransport},
    config::ClientConfig,
    logging,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();
    let config = ClientConfig::from_env()?;

    match config.server_command.as_deref() {
        Some([program, args @ ..]) => {
            let transport = ChildProcessTransport::spawn(program, args)?;
            print_capabilities(ClientSession::new(transport)).await?;
        }
        _ => {
            let mut transport = HttpTransport::new(config.server_url.as_str());
            if let Some(token) = config.api_token.as_deref() {
                transport = transport.with_bearer_token(token);
            }
            info!(endpoint = %transport.endpoint(), "connecting over HTTP");
            print_capabilities(ClientSession::new(transport)).await?;
        }
    }

    Ok(())
}

async fn print_capabilities<T: McpTransport>(
    mut session: ClientSession<T>,
) -> Result<(), ClientError> {
    session.initialize().await?;

    let prompts = session.list_prompts(None).await?;
    println!("{prompts:#?}");
    let resources = session.list_resources(None).await?;
    println!("{resources:#?}");
    let templates = session.list_resource_templates(None).await?;
    println!("{templates:#?}");
    let tools = session.list_tools(None).await?;
    println!("{tools:#?}");

    session.close().await
}
