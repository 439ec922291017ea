//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server
//! engine. All types derive Serde traits for deserialization from config
//! files; listen endpoints are written as plain address strings.

use serde::{Deserialize, Serialize};

use crate::addr::endpoint::EndpointDescriptor;

/// Root configuration for the server engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Number of worker event-loop threads.
    pub workers: usize,

    /// Explicitly configured listen endpoints. When non-empty these take
    /// precedence over any externally supplied addresses.
    pub listen: Vec<EndpointDescriptor>,

    /// Request parsing limits shared with the HTTP layer.
    pub limits: RequestLimits,

    /// Listener tuning (backlog, connection ceiling).
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            listen: Vec::new(),
            limits: RequestLimits::default(),
            listener: ListenerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Request parsing limits.
///
/// The startup core only validates their relationships; enforcement belongs
/// to the connection-processing layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLimits {
    /// Upper bound on the request buffer. `None` removes the bound.
    pub max_request_buffer_size: Option<usize>,

    /// Maximum length of the request line.
    pub max_request_line_size: usize,

    /// Maximum combined size of the request headers.
    pub max_request_headers_size: usize,

    /// Maximum number of request headers.
    pub max_request_header_count: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_request_buffer_size: Some(1024 * 1024),
            max_request_line_size: 8 * 1024,
            max_request_headers_size: 32 * 1024,
            max_request_header_count: 100,
        }
    }
}

/// Listener tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Accept backlog passed to the OS.
    pub backlog: u32,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            backlog: 1024,
            max_connections: 10_000,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_positive_workers() {
        assert!(ServerConfig::default().workers > 0);
    }

    #[test]
    fn listen_endpoints_deserialize_from_strings() {
        let config: ServerConfig =
            toml::from_str(r#"listen = ["http://127.0.0.1:8080", "unix:/run/app.sock"]"#).unwrap();
        assert_eq!(config.listen.len(), 2);
        assert_eq!(config.listen[0].to_string(), "http://127.0.0.1:8080");
        assert!(config.listen[1].unix_path().is_some());
    }

    #[test]
    fn invalid_listen_endpoint_is_a_deserialize_error() {
        assert!(toml::from_str::<ServerConfig>(r#"listen = ["ftp://x"]"#).is_err());
    }
}
