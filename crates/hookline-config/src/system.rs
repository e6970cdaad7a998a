//! Server configuration parsing.

use crate::nodes::{get_first_integer_arg, get_first_string_arg};
use crate::{ConfigError, ConfigResult};
use kdl::KdlDocument;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where run requests are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    /// Keep the most recent jobs in process memory. For local development.
    Memory,
    /// Create `IntegrationJob` custom resources.
    Kubernetes,
}

impl std::str::FromStr for SinkBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(SinkBackend::Memory),
            "kubernetes" => Ok(SinkBackend::Kubernetes),
            _ => Err(format!("Unknown sink backend: {}", s)),
        }
    }
}

/// Webhook server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub listen: String,
    /// Directory holding integration configs.
    pub config_dir: PathBuf,
    /// Timeout applied to outbound git provider calls.
    pub http_timeout_secs: u64,
    pub sink: SinkBackend,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            config_dir: PathBuf::from("/etc/hookline/configs"),
            http_timeout_secs: 30,
            sink: SinkBackend::Memory,
        }
    }
}

/// Parse server configuration from KDL text. Absent nodes keep defaults.
///
/// ```kdl
/// listen "0.0.0.0:8080"
/// config-dir "/etc/hookline/configs"
/// http-timeout-secs 30
/// sink "kubernetes"
/// ```
pub fn parse_server_config(kdl: &str) -> ConfigResult<ServerConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = ServerConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "listen" => {
                config.listen = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("listen address".to_string()))?;
            }
            "config-dir" => {
                let dir = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("config-dir path".to_string()))?;
                config.config_dir = PathBuf::from(dir);
            }
            "http-timeout-secs" => {
                let secs = get_first_integer_arg(node).ok_or_else(|| {
                    ConfigError::MissingField("http-timeout-secs value".to_string())
                })?;
                config.http_timeout_secs =
                    u64::try_from(secs).map_err(|_| ConfigError::InvalidValue {
                        field: "http-timeout-secs".to_string(),
                        message: format!("must be a non-negative integer, got {}", secs),
                    })?;
            }
            "sink" => {
                let backend = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("sink backend".to_string()))?;
                config.sink = backend.parse().map_err(|message| ConfigError::InvalidValue {
                    field: "sink".to_string(),
                    message,
                })?;
            }
            _ => {}
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_config() {
        let kdl = r#"
            listen "127.0.0.1:9000"
            config-dir "/srv/hookline"
            http-timeout-secs 5
            sink "kubernetes"
        "#;

        let config = parse_server_config(kdl).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.config_dir, PathBuf::from("/srv/hookline"));
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.sink, SinkBackend::Kubernetes);
    }

    #[test]
    fn test_defaults() {
        let config = parse_server_config("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_unknown_sink() {
        let result = parse_server_config(r#"sink "postgres""#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_negative_timeout() {
        let result = parse_server_config("http-timeout-secs -1");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
