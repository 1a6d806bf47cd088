// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for the HEC receiver.

use std::net::SocketAddr;
use std::time::Duration;

/// Request rejected before or while opening the body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid method")]
    InvalidMethod,

    #[error("invalid content type")]
    InvalidContentType,

    #[error("invalid encoding")]
    InvalidEncoding,

    #[error("failed to open gzip body: {0}")]
    GzipReader(#[source] std::io::Error),

    #[error("request body exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

/// The request body could not be read or decoded into events.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to decode event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read request body: {0}")]
    Body(String),
}

/// A decoded record the receiver does not accept.
#[derive(Debug, thiserror::Error)]
pub enum UnsupportedRecordError {
    #[error("metric event at position {index} is not supported")]
    MetricEvent { index: usize },
}

/// Failure reported by (or while waiting for) the downstream consumer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsumerError {
    #[error("downstream consumer rejected logs: {0}")]
    Rejected(String),

    #[error("downstream consumer did not respond within {0:?}")]
    Timeout(Duration),
}

/// Lifecycle and listener errors.
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    #[error("failed to bind to address {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("listener failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("receiver already started")]
    AlreadyStarted,

    #[error("receiver already stopped")]
    AlreadyStopped,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
