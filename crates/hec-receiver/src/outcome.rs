// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Terminal result of one HEC request and its mapping to an HTTP response and span fields.

use hyper::StatusCode;
use tracing::{debug, Span};

use crate::errors::{ConsumerError, DecodeError, TransportError, UnsupportedRecordError};
use crate::event::ClassifyError;
use crate::http_utils::{create_json_response, HttpResponse};

pub const RESPONSE_OK: &str = "OK";
pub const RESPONSE_INVALID_METHOD: &str = r#"Only "POST" method is supported"#;
pub const RESPONSE_INVALID_CONTENT_TYPE: &str = r#""Content-Type" must be "application/json""#;
pub const RESPONSE_INVALID_ENCODING: &str = r#""Content-Encoding" must be "gzip" or empty"#;
pub const RESPONSE_ERR_GZIP_READER: &str = "Error on gzip body";
pub const RESPONSE_ERR_PAYLOAD_TOO_LARGE: &str = "Request body exceeds the maximum allowed size";
pub const RESPONSE_ERR_UNMARSHAL_BODY: &str = "Failed to unmarshal message body";
pub const RESPONSE_ERR_NEXT_CONSUMER: &str = "Internal Server Error";
pub const RESPONSE_ERR_UNSUPPORTED_METRIC_EVENT: &str = "Unsupported metric event";

#[derive(Debug)]
pub enum RequestOutcome {
    /// Declared `Content-Length: 0`; nothing was decoded or forwarded.
    EmptyBody,
    /// The batch, possibly without records, was taken by the consumer.
    Accepted { records: usize },
    RejectedTransport(TransportError),
    RejectedMalformed(DecodeError),
    RejectedUnsupported(UnsupportedRecordError),
    DownstreamFailed {
        records: usize,
        error: ConsumerError,
    },
}

/// Status recorded on the request span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStatus {
    Ok,
    InvalidArgument,
    Internal,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Ok => "ok",
            SpanStatus::InvalidArgument => "invalid_argument",
            SpanStatus::Internal => "internal",
        }
    }
}

impl From<ClassifyError> for RequestOutcome {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::Malformed(e) => RequestOutcome::RejectedMalformed(e),
            ClassifyError::Unsupported(e) => RequestOutcome::RejectedUnsupported(e),
        }
    }
}

impl From<TransportError> for RequestOutcome {
    fn from(err: TransportError) -> Self {
        RequestOutcome::RejectedTransport(err)
    }
}

impl RequestOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestOutcome::EmptyBody => StatusCode::OK,
            RequestOutcome::Accepted { .. } => StatusCode::ACCEPTED,
            RequestOutcome::RejectedTransport(e) => match e {
                TransportError::InvalidMethod | TransportError::GzipReader(_) => {
                    StatusCode::BAD_REQUEST
                }
                TransportError::InvalidContentType | TransportError::InvalidEncoding => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                TransportError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            },
            RequestOutcome::RejectedMalformed(_) | RequestOutcome::RejectedUnsupported(_) => {
                StatusCode::BAD_REQUEST
            }
            RequestOutcome::DownstreamFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client, JSON encoded, for this outcome.
    pub fn response_message(&self) -> &'static str {
        match self {
            RequestOutcome::EmptyBody | RequestOutcome::Accepted { .. } => RESPONSE_OK,
            RequestOutcome::RejectedTransport(e) => match e {
                TransportError::InvalidMethod => RESPONSE_INVALID_METHOD,
                TransportError::InvalidContentType => RESPONSE_INVALID_CONTENT_TYPE,
                TransportError::InvalidEncoding => RESPONSE_INVALID_ENCODING,
                TransportError::GzipReader(_) => RESPONSE_ERR_GZIP_READER,
                TransportError::PayloadTooLarge { .. } => RESPONSE_ERR_PAYLOAD_TOO_LARGE,
            },
            RequestOutcome::RejectedMalformed(_) => RESPONSE_ERR_UNMARSHAL_BODY,
            RequestOutcome::RejectedUnsupported(_) => RESPONSE_ERR_UNSUPPORTED_METRIC_EVENT,
            RequestOutcome::DownstreamFailed { .. } => RESPONSE_ERR_NEXT_CONSUMER,
        }
    }

    pub fn span_status(&self) -> SpanStatus {
        match self {
            RequestOutcome::EmptyBody | RequestOutcome::Accepted { .. } => SpanStatus::Ok,
            RequestOutcome::DownstreamFailed { .. } => SpanStatus::Internal,
            _ => SpanStatus::InvalidArgument,
        }
    }

    /// Internal error text; recorded on the span and in debug logs, never sent to the client.
    pub fn error_message(&self) -> Option<String> {
        match self {
            RequestOutcome::EmptyBody | RequestOutcome::Accepted { .. } => None,
            // validation failures carry no underlying error
            RequestOutcome::RejectedTransport(
                TransportError::InvalidMethod
                | TransportError::InvalidContentType
                | TransportError::InvalidEncoding,
            ) => None,
            RequestOutcome::RejectedTransport(e) => Some(e.to_string()),
            RequestOutcome::RejectedMalformed(e) => Some(e.to_string()),
            RequestOutcome::RejectedUnsupported(e) => Some(e.to_string()),
            RequestOutcome::DownstreamFailed { error, .. } => Some(error.to_string()),
        }
    }

    /// Records the outcome on `span` and builds the one response for the request.
    pub fn respond(self, span: &Span) -> HttpResponse {
        let status = self.status_code();
        let message = self.response_message();
        let span_status = self.span_status();

        match &self {
            RequestOutcome::EmptyBody => {
                span.record("status", span_status.as_str());
            }
            RequestOutcome::Accepted { records } => {
                span.record("http.status_code", status.as_u16());
                span.record("accepted_log_records", *records as u64);
                span.record("refused_log_records", 0u64);
                span.record("status", span_status.as_str());
            }
            _ => {
                let error = self.error_message();
                span.record("http.status_code", status.as_u16());
                span.record("http.status_text", message);
                span.record("status", span_status.as_str());
                if let Some(error) = &error {
                    span.record("status_message", error.as_str());
                }
                if let RequestOutcome::DownstreamFailed { records, .. } = &self {
                    span.record("accepted_log_records", 0u64);
                    span.record("refused_log_records", *records as u64);
                }
                span.in_scope(|| {
                    debug!(
                        http_status_code = status.as_u16(),
                        msg = message,
                        error = error.as_deref().unwrap_or(""),
                        "HEC receiver request failed"
                    );
                });
            }
        }

        create_json_response(message, status)
    }
}
