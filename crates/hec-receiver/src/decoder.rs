// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns a request body into a lazy sequence of [`Event`]s.
//!
//! HEC bodies are concatenated JSON objects (`{..}{..}` or one per line), not a JSON array.
//! Decoding pulls one value at a time and stops for good at the first malformed value.

use std::io::{self, BufReader, Read};

use bytes::{Buf, Bytes};
use flate2::read::MultiGzDecoder;
use serde_json::de::IoRead;
use serde_json::StreamDeserializer;

use crate::errors::{DecodeError, TransportError};
use crate::event::Event;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_METHOD_DEFLATE: u8 = 8;
const GZIP_HEADER_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Identity,
    Gzip,
}

/// Opens the collected body for reading, decompressing it when needed.
///
/// A gzip body whose header, optional sections included, is not valid fails here, before any
/// event is decoded.
/// Decompressed output larger than `max_decoded_len` surfaces as a read error while decoding.
pub fn open_body(
    body: Bytes,
    encoding: BodyEncoding,
    max_decoded_len: usize,
) -> Result<Box<dyn Read + Send>, TransportError> {
    match encoding {
        BodyEncoding::Identity => Ok(Box::new(body.reader())),
        BodyEncoding::Gzip => {
            check_gzip_header(&body).map_err(TransportError::GzipReader)?;
            let decoder = MultiGzDecoder::new(body.reader());
            // the whole body is in memory, so the header is parsed by now or never will be
            if decoder.header().is_none() {
                return Err(TransportError::GzipReader(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid gzip header",
                )));
            }
            Ok(Box::new(BufReader::new(DecodedLimit {
                inner: decoder,
                remaining: max_decoded_len as u64,
            })))
        }
    }
}

fn check_gzip_header(body: &[u8]) -> io::Result<()> {
    if body.len() < GZIP_HEADER_LEN {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "gzip body is shorter than its header",
        ));
    }
    if body[..2] != GZIP_MAGIC || body[2] != GZIP_METHOD_DEFLATE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid gzip header",
        ));
    }
    Ok(())
}

/// Fails reads once more than `remaining` bytes would have been produced.
struct DecodedLimit<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> Read for DecodedLimit<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            let mut probe = [0u8; 1];
            return match self.inner.read(&mut probe)? {
                0 => Ok(0),
                _ => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "decompressed body exceeds the maximum allowed size",
                )),
            };
        }
        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let read = self.inner.read(&mut buf[..max])?;
        self.remaining -= read as u64;
        Ok(read)
    }
}

/// Lazy, finite, non-restartable sequence of decoded events.
///
/// Yields at most one error, after which it is exhausted.
pub struct EventStream {
    inner: StreamDeserializer<'static, IoRead<Box<dyn Read + Send>>, Event>,
    failed: bool,
}

impl EventStream {
    pub fn new(reader: Box<dyn Read + Send>) -> Self {
        EventStream {
            inner: serde_json::Deserializer::from_reader(reader).into_iter::<Event>(),
            failed: false,
        }
    }
}

impl Iterator for EventStream {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.inner.next()? {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                self.failed = true;
                Some(Err(DecodeError::Json(err)))
            }
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn decode(body: impl Into<Bytes>, encoding: BodyEncoding) -> Vec<Result<Event, DecodeError>> {
        let reader = open_body(body.into(), encoding, 1024 * 1024).unwrap();
        EventStream::new(reader).collect()
    }

    #[test]
    fn test_decode_concatenated_objects() {
        let events = decode(
            r#"{"event":"a"}{"event":"b"}
               {"event":"c"}"#,
            BodyEncoding::Identity,
        );
        let bodies: Vec<_> = events.into_iter().map(|e| e.unwrap().event).collect();
        assert_eq!(bodies, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_decode_whitespace_only_body() {
        assert!(decode("  \n\t ", BodyEncoding::Identity).is_empty());
    }

    #[test]
    fn test_decode_stops_after_first_error() {
        let events = decode(
            r#"{"event":"a"} {"event": } {"event":"c"}"#,
            BodyEncoding::Identity,
        );
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_rejects_array_body() {
        let events = decode(r#"[{"event":"a"}]"#, BodyEncoding::Identity);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }

    #[test]
    fn test_decode_gzip_matches_identity() {
        let raw = r#"{"event":"a","fields":{"k":1}}{"event":{"nested":true},"time":5}"#;
        let plain: Vec<_> = decode(raw, BodyEncoding::Identity)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        let compressed: Vec<_> = decode(gzip(raw.as_bytes()), BodyEncoding::Gzip)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain, compressed);
    }

    #[test]
    fn test_open_gzip_invalid_header() {
        let err = open_body(
            Bytes::from_static(br#"{"event":"not gzip"}"#),
            BodyEncoding::Gzip,
            1024,
        )
        .err()
        .unwrap();
        assert!(matches!(err, TransportError::GzipReader(_)));

        let err = open_body(Bytes::new(), BodyEncoding::Gzip, 1024).err().unwrap();
        assert!(matches!(err, TransportError::GzipReader(_)));
    }

    #[test]
    fn test_open_gzip_corrupt_optional_header() {
        // FNAME flag set, name never terminated
        let mut body = vec![0x1f, 0x8b, 0x08, 0x08, 0, 0, 0, 0, 0x00, 0xff];
        body.extend_from_slice(b"events.json");
        let err = open_body(Bytes::from(body), BodyEncoding::Gzip, 1024)
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::GzipReader(_)));

        // FEXTRA claims more bytes than the body has
        let mut body = vec![0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0x00, 0xff, 0x40, 0x00];
        body.extend_from_slice(b"short");
        let err = open_body(Bytes::from(body), BodyEncoding::Gzip, 1024)
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::GzipReader(_)));
    }

    #[test]
    fn test_truncated_gzip_is_decode_error() {
        let compressed = gzip(br#"{"event":"a"}{"event":"b"}{"event":"c"}"#);
        let truncated = Bytes::copy_from_slice(&compressed[..compressed.len() - 12]);
        let reader = open_body(truncated, BodyEncoding::Gzip, 1024).unwrap();
        let events: Vec<_> = EventStream::new(reader).collect();
        assert!(events.last().unwrap().is_err());
    }

    #[test]
    fn test_gzip_decoded_limit() {
        let raw = format!(r#"{{"event":"{}"}}"#, "A".repeat(4096));
        let compressed = gzip(raw.as_bytes());
        let reader = open_body(compressed.into(), BodyEncoding::Gzip, 1024).unwrap();
        let events: Vec<_> = EventStream::new(reader).collect();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }

    #[test]
    fn test_gzip_limit_exact_fit() {
        let raw = r#"{"event":"fits"}"#;
        let compressed = gzip(raw.as_bytes());
        let reader = open_body(compressed.into(), BodyEncoding::Gzip, raw.len()).unwrap();
        let events: Vec<_> = EventStream::new(reader).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().event, json!("fits"));
    }
}
