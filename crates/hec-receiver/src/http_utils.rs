// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    header::{self, HeaderMap, HeaderValue},
    Method, Response, StatusCode,
};
use serde_json::json;
use tracing::debug;

use crate::decoder::BodyEncoding;
use crate::errors::TransportError;

pub type HttpResponse = Response<Full<Bytes>>;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const GZIP_ENCODING: &str = "gzip";
/// HEC clients send `Authorization: Splunk <token>`.
pub const HEC_TOKEN_SCHEME: &str = "Splunk ";

/// Checks method, content type and content encoding, in that order, without touching the body.
///
/// Returns how the body is encoded when the request may proceed.
pub fn validate_request(
    method: &Method,
    header_map: &HeaderMap,
) -> Result<BodyEncoding, TransportError> {
    if *method != Method::POST {
        return Err(TransportError::InvalidMethod);
    }

    let content_type = header_map
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    if content_type != Some(JSON_CONTENT_TYPE) {
        return Err(TransportError::InvalidContentType);
    }

    match header_map.get(header::CONTENT_ENCODING) {
        None => Ok(BodyEncoding::Identity),
        Some(value) => match value.to_str() {
            Ok("") => Ok(BodyEncoding::Identity),
            Ok(GZIP_ENCODING) => Ok(BodyEncoding::Gzip),
            _ => Err(TransportError::InvalidEncoding),
        },
    }
}

/// Takes a request's header map and checks the declared "content-length" against
/// max_content_length.
///
/// Returns the declared length, or None when the body is streamed without one. A header hyper
/// let through but that does not parse is treated as undeclared; the body is still bounded
/// while it is collected.
pub fn verify_request_content_length(
    header_map: &HeaderMap,
    max_content_length: usize,
) -> Result<Option<usize>, TransportError> {
    let Some(content_length_header) = header_map.get(header::CONTENT_LENGTH) else {
        if let Some(transfer_encoding_header) = header_map.get(header::TRANSFER_ENCODING) {
            debug!(
                "Transfer-Encoding header is present: {:?}",
                transfer_encoding_header
            );
        }
        return Ok(None);
    };
    let Some(content_length) = content_length_header
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
    else {
        return Ok(None);
    };
    if content_length > max_content_length {
        return Err(TransportError::PayloadTooLarge {
            limit: max_content_length,
        });
    }
    Ok(Some(content_length))
}

/// Extracts the client's HEC token from the Authorization header.
pub fn access_token(header_map: &HeaderMap) -> Option<String> {
    let value = header_map.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(HEC_TOKEN_SCHEME).unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Returns the given message, encoded as a JSON string, in the body of a response with the
/// given status code.
///
/// Response body format:
/// "message"
pub fn create_json_response(message: &str, status: StatusCode) -> HttpResponse {
    let body = json!(message).to_string();
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}

pub fn create_not_found_response() -> HttpResponse {
    let mut not_found = Response::new(Full::new(Bytes::new()));
    *not_found.status_mut() = StatusCode::NOT_FOUND;
    not_found
}
