// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lookup configuration.

use crate::multicast::{DEFAULT_PORT, DEFAULT_TIMEOUT, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Where and what to look up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Cluster address, unicast or multicast (default: 239.192.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Cluster port (default: 7574)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Local interface for multicast
    #[serde(default)]
    pub local: Option<IpAddr>,

    /// Multicast TTL (default: 4)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Target cluster, any cluster when unset
    #[serde(default)]
    pub cluster: Option<String>,

    /// NameService name to look up (default: Cluster/info)
    #[serde(default = "default_name")]
    pub name: String,

    /// Lookup timeout in milliseconds, 0 retries forever over UDP
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_host() -> String {
    "239.192.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_name() -> String {
    crate::lookup::CLUSTER_INFO.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            local: None,
            ttl: default_ttl(),
            cluster: None,
            name: default_name(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LookupConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Get the lookup timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port cannot be 0".into()));
        }
        if !(1..=255).contains(&self.ttl) {
            return Err(ConfigError::InvalidValue(format!(
                "ttl must be between 1 and 255, got {}",
                self.ttl
            )));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue("host cannot be empty".into()));
        }
        if self.name.is_empty() {
            return Err(ConfigError::InvalidValue("name cannot be empty".into()));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LookupConfig::default();
        assert_eq!(config.host, "239.192.0.0");
        assert_eq!(config.port, 7574);
        assert_eq!(config.ttl, 4);
        assert_eq!(config.name, "Cluster/info");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LookupConfig =
            serde_json::from_str(r#"{"host": "10.1.2.3", "cluster": "prod"}"#).unwrap();
        assert_eq!(config.host, "10.1.2.3");
        assert_eq!(config.cluster.as_deref(), Some("prod"));
        assert_eq!(config.port, 7574);
        assert_eq!(config.name, "Cluster/info");
        assert!(config.local.is_none());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.json");

        let config = LookupConfig {
            local: Some("192.168.0.10".parse().unwrap()),
            cluster: Some("east".into()),
            timeout_ms: 0,
            ..Default::default()
        };
        config.to_file(&path).unwrap();

        let loaded = LookupConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Duration::ZERO);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LookupConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = LookupConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation() {
        let port_zero = LookupConfig {
            port: 0,
            ..Default::default()
        };
        assert!(port_zero.validate().is_err());

        let ttl_zero = LookupConfig {
            ttl: 0,
            ..Default::default()
        };
        assert!(ttl_zero.validate().is_err());

        let ttl_high = LookupConfig {
            ttl: 256,
            ..Default::default()
        };
        assert!(ttl_high.validate().is_err());

        let no_name = LookupConfig {
            name: String::new(),
            ..Default::default()
        };
        assert!(no_name.validate().is_err());
    }
}
