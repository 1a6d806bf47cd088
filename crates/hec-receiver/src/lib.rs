// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Splunk HTTP Event Collector receiver.
//!
//! Accepts HEC JSON event streams over HTTP, plain or gzip encoded, and hands each request to a
//! [`consumer::LogsConsumer`] as a single batch of log records.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod consumer;
pub mod decoder;
pub mod errors;
pub mod event;
pub mod http_utils;
pub mod logs;
pub mod outcome;
pub mod receiver;
pub mod value;

pub use config::Config;
pub use consumer::LogsConsumer;
pub use receiver::{HecHandler, HecReceiver, Host, ReceiverStatus, HEC_PATH};
