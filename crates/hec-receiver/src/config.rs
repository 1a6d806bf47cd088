// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::errors::ConfigError;

const DEFAULT_RECEIVER_NAME: &str = "splunk_hec";
const DEFAULT_ENDPOINT: &str = "0.0.0.0:8088";
const DEFAULT_MAX_REQUEST_CONTENT_LENGTH: usize = 10 * 1024 * 1024; // 10MB in Bytes
const DEFAULT_SERVER_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CONSUMER_TIMEOUT_SECS: u64 = 20;

/// Configuration for the HEC receiver
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported in logs and spans
    pub name: String,
    /// Address to listen on, e.g. 0.0.0.0:8088
    pub endpoint: String,
    /// Copy the client's HEC token into the batch resource attributes
    pub access_token_passthrough: bool,
    /// Maximum request body size, compressed or not, in bytes
    pub max_request_content_length: usize,
    /// Time allowed to read request headers
    pub server_timeout: Duration,
    /// Time allowed for the downstream consumer to accept a batch
    pub consumer_timeout: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// TLS is terminated in front of the receiver; only reported as the span transport
    pub tls_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_RECEIVER_NAME.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token_passthrough: false,
            max_request_content_length: DEFAULT_MAX_REQUEST_CONTENT_LENGTH,
            server_timeout: Duration::from_secs(DEFAULT_SERVER_TIMEOUT_SECS),
            consumer_timeout: Duration::from_secs(DEFAULT_CONSUMER_TIMEOUT_SECS),
            log_level: "info".to_string(),
            tls_enabled: false,
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let name = env::var("HEC_RECEIVER_NAME").unwrap_or(defaults.name);
        let endpoint = env::var("HEC_ENDPOINT").unwrap_or(defaults.endpoint);
        let access_token_passthrough = env::var("HEC_ACCESS_TOKEN_PASSTHROUGH")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(defaults.access_token_passthrough);
        let max_request_content_length = env::var("HEC_MAX_REQUEST_CONTENT_LENGTH")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.max_request_content_length);
        let server_timeout = env::var("HEC_SERVER_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.server_timeout);
        let consumer_timeout = env::var("HEC_CONSUMER_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.consumer_timeout);
        let log_level = env::var("HEC_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);
        let tls_enabled = env::var("HEC_TLS_ENABLED")
            .map(|val| val.to_lowercase() == "true")
            .unwrap_or(defaults.tls_enabled);

        let config = Self {
            name,
            endpoint,
            access_token_passthrough,
            max_request_content_length,
            server_timeout,
            consumer_timeout,
            log_level,
            tls_enabled,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("empty endpoint".to_string()));
        }
        self.socket_addr()?;

        if self.max_request_content_length == 0 {
            return Err(ConfigError::InvalidConfig(
                "max request content length must be greater than 0".to_string(),
            ));
        }

        if self.server_timeout.is_zero() || self.consumer_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.endpoint.trim().parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidConfig(format!("invalid endpoint '{}': {e}", self.endpoint))
        })
    }

    /// Transport name recorded on request spans.
    pub fn transport(&self) -> &'static str {
        if self.tls_enabled {
            "https"
        } else {
            "http"
        }
    }
}
