//! Application configuration for the Opsflow Engine server.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `OPSFLOW_`:
/// - `OPSFLOW_HOST`: Server bind address (default: "0.0.0.0")
/// - `OPSFLOW_PORT`: Server port (default: 8090)
/// - `OPSFLOW_DEBUG`: Enable debug mode (default: false)
/// - `OPSFLOW_SERVER_NAME`: Server name for identification
/// - `OPSFLOW_API_TIMEOUT_SECONDS`: Default timeout for outbound API calls
/// - `OPSFLOW_CLASSIFIER_URL`: Remote classifier endpoint (optional)
/// - `OPSFLOW_CLASSIFIER_TIMEOUT_SECONDS`: Timeout for classifier requests
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable debug mode
    #[serde(default)]
    pub debug: bool,

    /// Server name for identification
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Default timeout applied to outbound API call steps, in seconds
    #[serde(default = "default_api_timeout")]
    pub api_timeout_seconds: u64,

    /// Remote classifier endpoint; the keyword fallback is used when unset
    #[serde(default)]
    pub classifier_url: Option<String>,

    /// Timeout for classifier requests, in seconds
    #[serde(default = "default_classifier_timeout")]
    pub classifier_timeout_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_server_name() -> String {
    "opsflow-engine".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

fn default_classifier_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `OPSFLOW_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("OPSFLOW_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            server_name: default_server_name(),
            api_timeout_seconds: default_api_timeout(),
            classifier_url: None,
            classifier_timeout_seconds: default_classifier_timeout(),
        }
    }
}
