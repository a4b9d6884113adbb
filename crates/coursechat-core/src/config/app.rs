//! `[server]` and `[server.cors]` sections.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Listener, socket endpoint, and shutdown settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Path of the WebSocket endpoint. Must start with `/`.
    pub socket_path: String,
    /// Seconds to wait for open connections to close on shutdown.
    pub shutdown_grace_seconds: u64,
    /// Cross-origin settings.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            socket_path: "/api/socket".to_owned(),
            shutdown_grace_seconds: 10,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rejects settings the router cannot mount.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.socket_path.starts_with('/') {
            return Err(AppError::configuration(format!(
                "server.socket_path must start with '/', got '{}'",
                self.socket_path
            )));
        }
        if self.cors.allowed_methods.is_empty() {
            return Err(AppError::configuration(
                "server.cors.allowed_methods must not be empty",
            ));
        }
        Ok(())
    }
}

/// Cross-origin resource sharing. `"*"` allows any origin or header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to open the socket and call the API.
    pub allowed_origins: Vec<String>,
    /// Allowed request methods.
    pub allowed_methods: Vec<String>,
    /// Allowed request headers.
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds.
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_owned()],
            allowed_methods: vec!["GET".to_owned(), "POST".to_owned()],
            allowed_headers: vec!["*".to_owned()],
            max_age_seconds: 3600,
        }
    }
}
