// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HEC event records and their classification into log and metric events.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use tracing::trace;

use crate::errors::{DecodeError, UnsupportedRecordError};

/// `event` value HEC clients use to mark a metric event.
pub const METRIC_EVENT_TYPE: &str = "metric";
/// Prefix of the `fields` keys that carry metric values.
pub const METRIC_NAME_PREFIX: &str = "metric_name:";

/// One event of the HEC JSON protocol, as sent by the client.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Event {
    /// Epoch seconds, possibly fractional.
    #[serde(default, deserialize_with = "deserialize_time")]
    pub time: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub host: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sourcetype: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub index: String,
    #[serde(default)]
    pub event: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: HashMap<String, serde_json::Value>,
}

impl Event {
    /// Metric events carry `"metric"` as their event or at least one `metric_name:` field.
    pub fn is_metric(&self) -> bool {
        self.event.as_str() == Some(METRIC_EVENT_TYPE)
            || self
                .fields
                .keys()
                .any(|key| key.starts_with(METRIC_NAME_PREFIX))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// HEC clients send `time` either as a JSON number or as a numeric string.
fn deserialize_time<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Number(f64),
        Text(String),
    }

    match Option::<RawTime>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTime::Number(secs)) => Ok(Some(secs)),
        Some(RawTime::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawTime::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid event time {text:?}"))),
    }
}

/// Why a stream of decoded events was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Malformed(#[from] DecodeError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedRecordError),
}

/// Drains decoded events, keeping log events in arrival order.
///
/// Stops at the first decode failure or metric event; nothing decoded before it is returned.
pub fn classify_events<I>(events: I) -> Result<Vec<Event>, ClassifyError>
where
    I: IntoIterator<Item = Result<Event, DecodeError>>,
{
    let mut log_events = Vec::new();
    for (index, event) in events.into_iter().enumerate() {
        let event = event?;
        if event.is_metric() {
            trace!("Rejecting metric event at position {index}");
            return Err(UnsupportedRecordError::MetricEvent { index }.into());
        }
        log_events.push(event);
    }
    Ok(log_events)
}
