// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use hec_receiver::{
    errors::{ConsumerError, ReceiverError},
    logs::Logs,
    Config, HecReceiver, Host, LogsConsumer,
};

/// Logs a summary of every batch. Stands in for a real export pipeline.
struct LoggingConsumer;

#[async_trait]
impl LogsConsumer for LoggingConsumer {
    async fn consume_logs(&self, logs: Logs) -> Result<(), ConsumerError> {
        info!("Received batch of {} log records", logs.log_record_count());
        for record in logs.log_records() {
            debug!(
                "record: timestamp={:?} body={:?}",
                record.timestamp_unix_nano, record.body
            );
        }
        Ok(())
    }
}

struct IntakeHost {
    fatal: CancellationToken,
}

impl Host for IntakeHost {
    fn report_fatal_error(&self, err: ReceiverError) {
        error!("HEC receiver failed: {err}");
        self.fatal.cancel();
    }
}

#[tokio::main]
pub async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error creating config on HEC intake startup: {e}");
            return;
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let receiver = match HecReceiver::new(config, Arc::new(LoggingConsumer)) {
        Ok(r) => r,
        Err(e) => {
            error!("Error creating HEC receiver: {e}");
            return;
        }
    };

    let fatal = CancellationToken::new();
    let host = Arc::new(IntakeHost {
        fatal: fatal.clone(),
    });
    if let Err(e) = receiver.start(host).await {
        error!("Error when starting HEC receiver: {e}");
        return;
    }

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("Unable to listen for shutdown signal: {e}");
            }
            info!("Shutdown signal received");
        }
        _ = fatal.cancelled() => {}
    }

    if let Err(e) = receiver.shutdown().await {
        error!("Error during HEC receiver shutdown: {e}");
    }
}
