// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Structured log batches handed to the downstream consumer.

use std::collections::HashMap;

use crate::event::Event;
use crate::value::Value;

/// Resource attribute holding the client's HEC token when passthrough is enabled.
pub const HEC_TOKEN_ATTRIBUTE: &str = "com.splunk.hec.access_token";
pub const HOST_NAME_ATTRIBUTE: &str = "host.name";
pub const SERVICE_NAME_ATTRIBUTE: &str = "service.name";
pub const SOURCETYPE_ATTRIBUTE: &str = "com.splunk.sourcetype";
pub const INDEX_ATTRIBUTE: &str = "com.splunk.index";

const NANOS_PER_SECOND: f64 = 1e9;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Logs {
    pub resource_logs: Vec<ResourceLogs>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceLogs {
    pub resource: Resource,
    pub scope_logs: Vec<ScopeLogs>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    pub attributes: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopeLogs {
    pub log_records: Vec<LogRecord>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogRecord {
    pub timestamp_unix_nano: Option<u64>,
    pub body: Value,
    pub attributes: HashMap<String, Value>,
}

impl Logs {
    pub fn log_record_count(&self) -> usize {
        self.resource_logs
            .iter()
            .flat_map(|rl| rl.scope_logs.iter())
            .map(|sl| sl.log_records.len())
            .sum()
    }

    /// Iterates every log record in batch order.
    pub fn log_records(&self) -> impl Iterator<Item = &LogRecord> {
        self.resource_logs
            .iter()
            .flat_map(|rl| rl.scope_logs.iter())
            .flat_map(|sl| sl.log_records.iter())
    }
}

impl From<Event> for LogRecord {
    fn from(event: Event) -> Self {
        let mut attributes: HashMap<String, Value> = event
            .fields
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect();

        for (key, value) in [
            (HOST_NAME_ATTRIBUTE, event.host),
            (SERVICE_NAME_ATTRIBUTE, event.source),
            (SOURCETYPE_ATTRIBUTE, event.sourcetype),
            (INDEX_ATTRIBUTE, event.index),
        ] {
            if !value.is_empty() {
                attributes.insert(key.to_string(), Value::Str(value));
            }
        }

        LogRecord {
            timestamp_unix_nano: event.time.and_then(seconds_to_nanos),
            body: Value::from(event.event),
            attributes,
        }
    }
}

fn seconds_to_nanos(secs: f64) -> Option<u64> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    // saturating float to int cast
    Some((secs * NANOS_PER_SECOND).round() as u64)
}

/// Builds one batch with a single resource and scope holding one record per event, in order.
pub fn assemble_logs(events: Vec<Event>, access_token: Option<&str>) -> Logs {
    let mut resource = Resource::default();
    if let Some(token) = access_token {
        resource
            .attributes
            .insert(HEC_TOKEN_ATTRIBUTE.to_string(), Value::Str(token.to_string()));
    }

    Logs {
        resource_logs: vec![ResourceLogs {
            resource,
            scope_logs: vec![ScopeLogs {
                log_records: events.into_iter().map(LogRecord::from).collect(),
            }],
        }],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(body: serde_json::Value) -> Event {
        Event {
            event: body,
            ..Default::default()
        }
    }

    #[test]
    fn test_assemble_preserves_count_and_order() {
        let events: Vec<Event> = (0..5).map(|i| event(json!(format!("line {i}")))).collect();
        let logs = assemble_logs(events, None);

        assert_eq!(logs.resource_logs.len(), 1);
        assert_eq!(logs.resource_logs[0].scope_logs.len(), 1);
        assert_eq!(logs.log_record_count(), 5);
        let bodies: Vec<_> = logs
            .log_records()
            .map(|r| r.body.as_str().unwrap().to_string())
            .collect();
        assert_eq!(bodies, vec!["line 0", "line 1", "line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_assemble_empty() {
        let logs = assemble_logs(Vec::new(), None);
        assert_eq!(logs.resource_logs.len(), 1);
        assert_eq!(logs.log_record_count(), 0);
    }

    #[test]
    fn test_assemble_access_token() {
        let logs = assemble_logs(vec![event(json!("x"))], Some("secret-token"));
        assert_eq!(
            logs.resource_logs[0].resource.attributes.get(HEC_TOKEN_ATTRIBUTE),
            Some(&Value::Str("secret-token".to_string()))
        );

        let logs = assemble_logs(vec![event(json!("x"))], None);
        assert!(logs.resource_logs[0].resource.attributes.is_empty());
    }

    #[test]
    fn test_log_record_from_event() {
        let event = Event {
            time: Some(1.5),
            host: "web-1".to_string(),
            source: "checkout".to_string(),
            sourcetype: "".to_string(),
            index: "main".to_string(),
            event: json!({"msg": "paid", "amount": 12}),
            fields: HashMap::from([
                ("region".to_string(), json!("eu")),
                ("retries".to_string(), json!(2)),
            ]),
        };

        let record = LogRecord::from(event);
        assert_eq!(record.timestamp_unix_nano, Some(1_500_000_000));
        let body = record.body.as_map().unwrap();
        assert_eq!(body["msg"], Value::Str("paid".to_string()));
        assert_eq!(body["amount"], Value::I64(12));

        assert_eq!(record.attributes["region"], Value::Str("eu".to_string()));
        assert_eq!(record.attributes["retries"], Value::I64(2));
        assert_eq!(
            record.attributes[HOST_NAME_ATTRIBUTE],
            Value::Str("web-1".to_string())
        );
        assert_eq!(
            record.attributes[SERVICE_NAME_ATTRIBUTE],
            Value::Str("checkout".to_string())
        );
        assert_eq!(
            record.attributes[INDEX_ATTRIBUTE],
            Value::Str("main".to_string())
        );
        assert!(!record.attributes.contains_key(SOURCETYPE_ATTRIBUTE));
    }

    #[test]
    fn test_invalid_timestamps_are_dropped() {
        assert_eq!(seconds_to_nanos(-1.0), None);
        assert_eq!(seconds_to_nanos(f64::NAN), None);
        assert_eq!(seconds_to_nanos(0.0), Some(0));
    }
}
