/// Configuration management for the TinyFlow engine
///
/// Handles server configuration, database connection, and deployment
/// provider parameters.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Deployment provider configuration
    pub provider: ProviderConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// SQLite database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (default: "data/tinyflow.db")
    pub path: String,
}

/// Deployment provider (Railway-compatible GraphQL API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// GraphQL endpoint for service creation
    pub api_url: String,
    /// Timeout for provider calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("TINYFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("TINYFLOW_PORT")
                    .unwrap_or_else(|_| "3006".to_string())
                    .parse()
                    .unwrap_or(3006),
            },
            database: DatabaseConfig {
                path: std::env::var("TINYFLOW_DB_PATH")
                    .unwrap_or_else(|_| "data/tinyflow.db".to_string()),
            },
            provider: ProviderConfig {
                api_url: std::env::var("TINYFLOW_PROVIDER_API_URL")
                    .unwrap_or_else(|_| "https://backboard.railway.app/graphql/v2".to_string()),
                request_timeout_secs: std::env::var("TINYFLOW_PROVIDER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
        }
    }
}
