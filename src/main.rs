use demo_mcp::{
    build_app,
    config::{Config, TransportMode},
    logging, stdio, AppState,
};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();
    info!("server starting up...");

    let config = Config::from_env()?;
    let state = AppState::new(config.api_token.clone(), config.server_name.clone());

    match config.transport {
        TransportMode::Stdio => {
            info!(server = %config.server_name, "serving MCP over stdio");
            stdio::serve_stdio(state, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await?;
        }
        TransportMode::Http => {
            let bind_socket = config.bind_socket()?;
            let app = build_app(state);
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                server = %config.server_name,
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                auth = config.api_token.is_some(),
                "server starting"
            );

            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
