// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock consumers and hosts for testing the receiver

use hec_receiver::{
    errors::{ConsumerError, ReceiverError},
    logs::Logs,
    Host, LogsConsumer,
};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Mock consumer that keeps every batch it is given
#[derive(Default)]
pub struct MockConsumer {
    pub batches: Mutex<Vec<Logs>>,
}

#[async_trait::async_trait]
impl LogsConsumer for MockConsumer {
    async fn consume_logs(&self, logs: Logs) -> Result<(), ConsumerError> {
        #[allow(clippy::unwrap_used)]
        self.batches.lock().unwrap().push(logs);
        Ok(())
    }
}

/// Mock consumer that signals when a batch arrives, then holds it for `delay`
#[allow(dead_code)]
pub struct SlowConsumer {
    pub delay: Duration,
    pub arrived: Notify,
    pub batches: Mutex<Vec<Logs>>,
}

#[allow(dead_code)]
impl SlowConsumer {
    pub fn new(delay: Duration) -> Self {
        SlowConsumer {
            delay,
            arrived: Notify::new(),
            batches: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LogsConsumer for SlowConsumer {
    async fn consume_logs(&self, logs: Logs) -> Result<(), ConsumerError> {
        self.arrived.notify_one();
        tokio::time::sleep(self.delay).await;
        #[allow(clippy::unwrap_used)]
        self.batches.lock().unwrap().push(logs);
        Ok(())
    }
}

/// Mock consumer that rejects every batch
#[allow(dead_code)]
pub struct RejectingConsumer;

#[async_trait::async_trait]
impl LogsConsumer for RejectingConsumer {
    async fn consume_logs(&self, _logs: Logs) -> Result<(), ConsumerError> {
        Err(ConsumerError::Rejected("exporter queue is full".to_string()))
    }
}

/// Mock host that records reported errors
#[derive(Default)]
pub struct MockHost {
    pub errors: Mutex<Vec<String>>,
}

impl Host for MockHost {
    fn report_fatal_error(&self, err: ReceiverError) {
        #[allow(clippy::unwrap_used)]
        self.errors.lock().unwrap().push(err.to_string());
    }
}
