use std::{env, net::SocketAddr, str::FromStr};

use thiserror::Error;

pub const DEFAULT_SERVER_NAME: &str = "Demo";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/mcp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Http,
    Stdio,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            _ => Err(ConfigError::InvalidTransport),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: Option<String>,
    pub bind_addr: String,
    pub bind_port: u16,
    pub server_name: String,
    pub transport: TransportMode,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub server_command: Option<Vec<String>>,
    pub api_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("MCP_TRANSPORT must be one of: http, stdio")]
    InvalidTransport,
    #[error("MCP_SERVER_URL must be an absolute http(s) URL")]
    InvalidServerUrl,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8000);
        let transport = non_empty_var("MCP_TRANSPORT")
            .map(|value| value.parse::<TransportMode>())
            .transpose()?
            .unwrap_or(TransportMode::Http);
        let server_name =
            non_empty_var("MCP_SERVER_NAME").unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        let config = Self {
            api_token: non_empty_var("MCP_API_TOKEN"),
            bind_addr,
            bind_port,
            server_name,
            transport,
        };

        if config.transport == TransportMode::Http {
            let _ = config.bind_socket()?;
        }
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url =
            non_empty_var("MCP_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidServerUrl);
        }

        let server_command = non_empty_var("MCP_SERVER_COMMAND").map(|command| {
            command
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        Ok(Self {
            server_url,
            server_command,
            api_token: non_empty_var("MCP_API_TOKEN"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-global, so every env-dependent case runs in one test.
    #[test]
    fn parse_from_env() {
        env::remove_var("MCP_API_TOKEN");
        env::remove_var("BIND_ADDR");
        env::remove_var("BIND_PORT");
        env::remove_var("MCP_TRANSPORT");
        env::remove_var("MCP_SERVER_NAME");
        env::remove_var("MCP_SERVER_URL");
        env::remove_var("MCP_SERVER_COMMAND");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8000);
        assert_eq!(config.api_token, None);
        assert_eq!(config.server_name, "Demo");
        assert_eq!(config.transport, TransportMode::Http);

        env::set_var("MCP_API_TOKEN", "  abc  ");
        env::set_var("MCP_TRANSPORT", "STDIO");
        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.transport, TransportMode::Stdio);

        env::set_var("MCP_TRANSPORT", "carrier-pigeon");
        let err = Config::from_env().expect_err("expected invalid transport");
        assert!(matches!(err, ConfigError::InvalidTransport));
        env::remove_var("MCP_TRANSPORT");

        env::set_var("BIND_PORT", "99999");
        let err = Config::from_env().expect_err("expected invalid port");
        assert!(matches!(err, ConfigError::InvalidPort));
        env::remove_var("BIND_PORT");

        env::set_var("BIND_ADDR", "not an address");
        let err = Config::from_env().expect_err("expected invalid socket");
        assert!(matches!(err, ConfigError::InvalidSocket));
        env::remove_var("BIND_ADDR");

        let client = ClientConfig::from_env().expect("client config should parse");
        assert_eq!(client.server_url, DEFAULT_SERVER_URL);
        assert_eq!(client.server_command, None);
        assert_eq!(client.api_token.as_deref(), Some("abc"));

        env::set_var("MCP_SERVER_COMMAND", "demo-mcp --quiet");
        let client = ClientConfig::from_env().expect("client config should parse");
        assert_eq!(
            client.server_command,
            Some(vec!["demo-mcp".to_string(), "--quiet".to_string()])
        );
        env::remove_var("MCP_SERVER_COMMAND");

        env::set_var("MCP_SERVER_URL", "localhost:8000/mcp");
        let err = ClientConfig::from_env().expect_err("expected invalid url");
        assert!(matches!(err, ConfigError::InvalidServerUrl));
        env::remove_var("MCP_SERVER_URL");
        env::remove_var("MCP_API_TOKEN");
    }

    #[test]
    fn transport_mode_parses_case_insensitively() {
        assert_eq!(" Http ".parse::<TransportMode>().ok(), Some(TransportMode::Http));
        assert_eq!("stdio".parse::<TransportMode>().ok(), Some(TransportMode::Stdio));
        assert!("sse".parse::<TransportMode>().is_err());
    }
}
