// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP listener for the Splunk HEC protocol.
//!
//! Each request goes through validation, decoding, classification and batch assembly, then waits
//! for the downstream consumer before answering. Start and shutdown are serialized by one lock
//! that request handling never takes.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, field, info, Instrument};

use crate::config::Config;
use crate::consumer::LogsConsumer;
use crate::decoder::{open_body, EventStream};
use crate::errors::{ConfigError, ConsumerError, DecodeError, ReceiverError, TransportError};
use crate::event::{classify_events, Event};
use crate::http_utils::{
    access_token, create_not_found_response, validate_request, verify_request_content_length,
    HttpResponse,
};
use crate::logs::assemble_logs;
use crate::outcome::RequestOutcome;

pub const HEC_PATH: &str = "/services/collector";

/// The process hosting the receiver.
pub trait Host: Send + Sync {
    /// Called once if the listener fails after a successful start.
    fn report_fatal_error(&self, err: ReceiverError);
}

/// Source of inbound connections for the accept loop.
#[async_trait]
pub(crate) trait Acceptor: Send {
    type Conn: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn accept(&mut self) -> io::Result<Self::Conn>;
}

#[async_trait]
impl Acceptor for TcpListener {
    type Conn = TcpStream;

    async fn accept(&mut self) -> io::Result<TcpStream> {
        TcpListener::accept(self).await.map(|(conn, _)| conn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverStatus {
    Created,
    Started,
    /// Listener closed, waiting for in-flight requests.
    Draining,
    Stopped,
}

/// Handles single HEC requests. Cheap to share between connections.
pub struct HecHandler {
    config: Arc<Config>,
    consumer: Arc<dyn LogsConsumer + Send + Sync>,
}

impl HecHandler {
    pub fn new(config: Arc<Config>, consumer: Arc<dyn LogsConsumer + Send + Sync>) -> Self {
        HecHandler { config, consumer }
    }

    /// Answers one request. Requests to other paths get an empty 404.
    pub async fn handle<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if req.uri().path() != HEC_PATH {
            return create_not_found_response();
        }

        let span = tracing::info_span!(
            "hec_receive",
            receiver = %self.config.name,
            transport = self.config.transport(),
            http.status_code = field::Empty,
            http.status_text = field::Empty,
            status = field::Empty,
            status_message = field::Empty,
            accepted_log_records = field::Empty,
            refused_log_records = field::Empty,
        );
        let outcome = self.process(req).instrument(span.clone()).await;
        outcome.respond(&span)
    }

    async fn process<B>(&self, req: Request<B>) -> RequestOutcome
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let max_len = self.config.max_request_content_length;

        let encoding = match validate_request(&parts.method, &parts.headers) {
            Ok(encoding) => encoding,
            Err(e) => return e.into(),
        };
        let declared_len = match verify_request_content_length(&parts.headers, max_len) {
            Ok(len) => len,
            Err(e) => return e.into(),
        };

        let body = match Limited::new(body, max_len).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                return TransportError::PayloadTooLarge { limit: max_len }.into();
            }
            Err(e) => return RequestOutcome::RejectedMalformed(DecodeError::Body(e.to_string())),
        };

        // gzip and JSON decoding stay off the async workers
        let decode = move || -> Result<Option<Vec<Event>>, RequestOutcome> {
            let reader = open_body(body, encoding, max_len)?;
            if declared_len == Some(0) {
                return Ok(None);
            }
            Ok(Some(classify_events(EventStream::new(reader))?))
        };
        let decoded = tokio::task::spawn_blocking(decode).await;
        let events = match decoded {
            Ok(Ok(Some(events))) => events,
            Ok(Ok(None)) => return RequestOutcome::EmptyBody,
            Ok(Err(outcome)) => return outcome,
            Err(e) => {
                error!("HEC body decode task failed: {e}");
                return RequestOutcome::RejectedMalformed(DecodeError::Body(e.to_string()));
            }
        };

        let token = if self.config.access_token_passthrough {
            access_token(&parts.headers)
        } else {
            None
        };
        let records = events.len();
        let logs = assemble_logs(events, token.as_deref());
        debug!("Forwarding {records} log records to the downstream consumer");

        let timeout = self.config.consumer_timeout;
        match tokio::time::timeout(timeout, self.consumer.consume_logs(logs)).await {
            Ok(Ok(())) => RequestOutcome::Accepted { records },
            Ok(Err(error)) => RequestOutcome::DownstreamFailed { records, error },
            Err(_) => RequestOutcome::DownstreamFailed {
                records,
                error: ConsumerError::Timeout(timeout),
            },
        }
    }
}

struct Running {
    cancel_token: CancellationToken,
    server_handle: JoinHandle<()>,
}

/// Splunk HEC receiver. One instance per configuration.
pub struct HecReceiver {
    config: Arc<Config>,
    consumer: Arc<dyn LogsConsumer + Send + Sync>,
    lifecycle: Mutex<Option<Running>>,
    status_tx: watch::Sender<ReceiverStatus>,
}

impl HecReceiver {
    pub fn new(
        config: Config,
        consumer: Arc<dyn LogsConsumer + Send + Sync>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (status_tx, _status_rx) = watch::channel(ReceiverStatus::Created);
        Ok(HecReceiver {
            config: Arc::new(config),
            consumer,
            lifecycle: Mutex::new(None),
            status_tx,
        })
    }

    pub fn status(&self) -> ReceiverStatus {
        *self.status_tx.borrow()
    }

    /// Get a receiver for status updates.
    pub fn status_receiver(&self) -> watch::Receiver<ReceiverStatus> {
        self.status_tx.subscribe()
    }

    /// Binds the listener and starts serving. Returns the bound address.
    ///
    /// Listener failures after this returns are reported through `host`.
    pub async fn start(&self, host: Arc<dyn Host>) -> Result<SocketAddr, ReceiverError> {
        let mut lifecycle = self.lifecycle.lock().await;
        match self.status() {
            ReceiverStatus::Created => {}
            ReceiverStatus::Started | ReceiverStatus::Draining => {
                return Err(ReceiverError::AlreadyStarted)
            }
            ReceiverStatus::Stopped => return Err(ReceiverError::AlreadyStopped),
        }

        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ReceiverError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ReceiverError::Serve)?;

        let handler = Arc::new(HecHandler::new(
            Arc::clone(&self.config),
            Arc::clone(&self.consumer),
        ));
        let cancel_token = CancellationToken::new();
        let server_handle = tokio::spawn(serve_connections(
            listener,
            handler,
            self.config.server_timeout,
            cancel_token.clone(),
            host,
        ));

        *lifecycle = Some(Running {
            cancel_token,
            server_handle,
        });
        self.status_tx.send_replace(ReceiverStatus::Started);
        info!(
            "HEC receiver {} listening on {local_addr}{HEC_PATH}",
            self.config.name
        );
        Ok(local_addr)
    }

    /// Closes the listener and waits for in-flight requests to finish.
    ///
    /// Calling it again, or before `start`, is fine.
    pub async fn shutdown(&self) -> Result<(), ReceiverError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if self.status() == ReceiverStatus::Stopped {
            return Ok(());
        }

        if let Some(running) = lifecycle.take() {
            self.status_tx.send_replace(ReceiverStatus::Draining);
            debug!("Draining HEC receiver {}", self.config.name);
            running.cancel_token.cancel();
            if let Err(e) = running.server_handle.await {
                error!("HEC receiver server task failed: {e:?}");
            }
        }

        self.status_tx.send_replace(ReceiverStatus::Stopped);
        info!("HEC receiver {} stopped", self.config.name);
        Ok(())
    }
}

async fn serve_connections<L: Acceptor + 'static>(
    mut listener: L,
    handler: Arc<HecHandler>,
    header_read_timeout: std::time::Duration,
    cancel_token: CancellationToken,
    host: Arc<dyn Host>,
) {
    let mut server = http1::Builder::new();
    server
        .timer(TokioTimer::new())
        .header_read_timeout(header_read_timeout);
    let mut joinset = JoinSet::new();

    let result = loop {
        let conn = tokio::select! {
            _ = cancel_token.cancelled() => break Ok(()),
            con_res = listener.accept() => match con_res {
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionAborted
                            | io::ErrorKind::ConnectionReset
                            | io::ErrorKind::ConnectionRefused
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    error!("Server error: {e}");
                    break Err(ReceiverError::Serve(e));
                }
                Ok(conn) => conn,
            },
            finished = async {
                match joinset.join_next().await {
                    Some(finished) => finished,
                    None => std::future::pending().await,
                }
            } => match finished {
                Err(e) if e.is_panic() => {
                    // Don't kill server on panic - log and continue
                    error!("Connection handler panicked: {:?}", e);
                    continue;
                },
                Ok(()) | Err(_) => continue,
            },
        };

        let conn = TokioIo::new(conn);
        let server = server.clone();
        let handler = Arc::clone(&handler);
        let cancel_token = cancel_token.clone();
        joinset.spawn(async move {
            let service = service_fn(move |req| {
                let handler = Arc::clone(&handler);
                async move { Ok::<_, Infallible>(handler.handle(req).await) }
            });
            let connection = server.serve_connection(conn, service);
            tokio::pin!(connection);
            let res = tokio::select! {
                res = connection.as_mut() => res,
                _ = cancel_token.cancelled() => {
                    // finish the request in flight, then close
                    connection.as_mut().graceful_shutdown();
                    connection.await
                }
            };
            if let Err(e) = res {
                debug!("Connection error: {e}");
            }
        });
    };

    drop(listener);
    if result.is_err() {
        cancel_token.cancel();
    }
    while let Some(finished) = joinset.join_next().await {
        if let Err(e) = finished {
            if e.is_panic() {
                error!("Connection handler panicked: {:?}", e);
            }
        }
    }

    if let Err(e) = result {
        host.report_fatal_error(e);
    }
}
