//! Configuration management for the MCP server
//!
//! Values are layered: built-in defaults, then an optional `config.toml`,
//! then `MCP_SERVER_*` environment variables, and finally `PORT`.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

/// Config file looked up in the working directory, extension optional.
pub const DEFAULT_CONFIG_FILE: &str = "config";
pub const ENV_PREFIX: &str = "MCP_SERVER";
pub const PORT_ENV: &str = "PORT";

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENDPOINT_PATH: &str = "/mcp";
pub const DEFAULT_SSE_KEEP_ALIVE_SECS: u64 = 15;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// TCP port; `PORT` in the environment wins over everything else
    pub port: u16,

    /// Path serving POST, GET and DELETE
    pub endpoint_path: String,

    /// Interval between SSE keep-alive comments
    pub sse_keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            sse_keep_alive_secs: DEFAULT_SSE_KEEP_ALIVE_SECS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (if any) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            File::with_name(DEFAULT_CONFIG_FILE).required(false),
            std::env::var(PORT_ENV).ok(),
        )
    }

    /// Load configuration from an explicit file source and `PORT` value.
    pub fn load_from<S>(file: S, port: Option<String>) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("endpoint_path", DEFAULT_ENDPOINT_PATH)?
            .set_default("sse_keep_alive_secs", DEFAULT_SSE_KEEP_ALIVE_SECS as i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX));

        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            let port: u16 = port.trim().parse().map_err(|_| {
                ConfigError::Message(format!("{PORT_ENV} must be a port number, got '{port}'"))
            })?;
            builder = builder.set_override("port", i64::from(port))?;
        }

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if !self.endpoint_path.starts_with('/') {
            return Err(ConfigError::Message(
                "endpoint_path must start with '/'".into(),
            ));
        }

        if self.sse_keep_alive_secs == 0 {
            return Err(ConfigError::Message(
                "sse_keep_alive_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as `host:port`
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn sse_keep_alive(&self) -> Duration {
        Duration::from_secs(self.sse_keep_alive_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load(contents: &str, port: Option<&str>) -> Result<ServerConfig, ConfigError> {
        ServerConfig::load_from(
            File::from_str(contents, FileFormat::Toml),
            port.map(String::from),
        )
    }

    #[test]
    fn test_defaults() {
        let config = load("", None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_address(), "0.0.0.0:3000");
        assert_eq!(config.sse_keep_alive(), Duration::from_secs(15));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = load(
            "bind_address = \"127.0.0.1\"\nendpoint_path = \"/rpc\"\nport = 8080",
            None,
        )
        .unwrap();
        assert_eq!(config.socket_address(), "127.0.0.1:8080");
        assert_eq!(config.endpoint_path, "/rpc");
    }

    #[test]
    fn test_port_env_wins() {
        let config = load("port = 8080", Some("4000")).unwrap();
        assert_eq!(config.port, 4000);

        let config = load("", Some(" ")).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load("", Some("http")).is_err());
        assert!(load("", Some("0")).is_err());
        assert!(load("endpoint_path = \"mcp\"", None).is_err());
        assert!(load("sse_keep_alive_secs = 0", None).is_err());
    }
}
