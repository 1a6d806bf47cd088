// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::errors::ConsumerError;
use crate::logs::Logs;

#[async_trait]
pub trait LogsConsumer {
    /// Takes ownership of one assembled batch.
    ///
    /// The receiver awaits this call before answering the client, and never retries it.
    async fn consume_logs(&self, logs: Logs) -> Result<(), ConsumerError>;
}
