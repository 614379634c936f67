use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_MAX_REQUEST_LINE};
use crate::error::ConnectionError;
use crate::http::mime;
use crate::http::parser::{ParseError, find_line_end, parse_request_line};
use crate::http::request::Request;
use crate::http::resource::{self, Resource};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// Per-connection settings, shared read-only by every handler.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub document_root: PathBuf,
    pub confine_to_root: bool,
    pub read_timeout: Option<Duration>,
    pub max_request_line: usize,
}

impl ConnectionSettings {
    /// Baseline settings: no confinement, no deadline.
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        Self {
            document_root: document_root.into(),
            confine_to_root: false,
            read_timeout: None,
            max_request_line: DEFAULT_MAX_REQUEST_LINE,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            document_root: cfg.static_files.document_root.clone(),
            confine_to_root: cfg.static_files.confine_to_root,
            read_timeout: cfg.server.read_timeout_secs.map(Duration::from_secs),
            max_request_line: cfg.server.max_request_line,
        }
    }
}

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    settings: Arc<ConnectionSettings>,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitRequestLine,
    ClassifyResource(Request),
    StreamFile { response: Response, len: u64 },
    EmitError(Response),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, settings: Arc<ConnectionSettings>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(1024),
            settings,
            state: ConnectionState::AwaitRequestLine,
        }
    }

    /// Serves at most one request, then shuts the stream down.
    ///
    /// The shutdown is attempted on every path. The stream itself is released
    /// when the `Connection` is dropped.
    pub async fn run(&mut self) -> Result<(), ConnectionError> {
        let result = self.drive().await;
        self.state = ConnectionState::Closed;

        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Shutdown after response failed");
        }

        result
    }

    async fn drive(&mut self) -> Result<(), ConnectionError> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitRequestLine => {
                    self.state = match self.read_request().await? {
                        Some(req) => ConnectionState::ClassifyResource(req),
                        None => ConnectionState::Closed,
                    };
                }

                ConnectionState::ClassifyResource(req) => {
                    self.state = self.handle_request(&req).await;
                }

                ConnectionState::StreamFile { response, len } => {
                    let sent = ResponseWriter::new(response)
                        .write_to_stream(&mut self.stream)
                        .await
                        .map_err(ConnectionError::Write)?;

                    if sent < len {
                        warn!(declared = len, sent, "File shrank while streaming");
                    }
                    info!(status = 200, bytes = sent, "Response sent");
                }

                ConnectionState::EmitError(response) => {
                    let status = response.status.as_u16();
                    ResponseWriter::new(response)
                        .write_to_stream(&mut self.stream)
                        .await
                        .map_err(ConnectionError::Write)?;

                    info!(status, "Response sent");
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Reads and parses the request line.
    ///
    /// `Ok(None)` means the client sent nothing usable (EOF or a blank line)
    /// and the connection should close silently.
    pub async fn read_request(&mut self) -> Result<Option<Request>, ConnectionError> {
        let read_timeout = self.settings.read_timeout;
        let line = match read_timeout {
            Some(limit) => timeout(limit, self.read_line())
                .await
                .map_err(|_| ConnectionError::Timeout)??,
            None => self.read_line().await?,
        };

        let Some(line) = line else {
            return Ok(None);
        };

        match parse_request_line(&line) {
            Ok(req) => {
                info!(
                    method = req.method.as_str(),
                    path = %req.path,
                    version = %req.version,
                    "Request line"
                );
                Ok(Some(req))
            }
            Err(ParseError::Blank) => Ok(None),
            Err(ParseError::Malformed) => Err(ConnectionError::Malformed),
        }
    }

    async fn read_line(&mut self) -> Result<Option<BytesMut>, ConnectionError> {
        let max = self.settings.max_request_line;

        loop {
            if let Some(end) = find_line_end(&self.buffer) {
                if end + 1 > max {
                    return Err(ConnectionError::Malformed);
                }
                return Ok(Some(self.buffer.split_to(end + 1)));
            }

            if self.buffer.len() >= max {
                return Err(ConnectionError::Malformed);
            }

            let n = self
                .stream
                .read_buf(&mut self.buffer)
                .await
                .map_err(ConnectionError::Read)?;

            if n == 0 {
                // Peer closed; an unterminated line still counts
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.buffer.split()));
            }
        }
    }

    async fn handle_request(&self, req: &Request) -> ConnectionState {
        if !req.is_get() {
            return ConnectionState::EmitError(Response::not_implemented());
        }

        let settings = &self.settings;
        match resource::classify(&settings.document_root, &req.path, settings.confine_to_root).await
        {
            Resource::File { file, len, name } => ConnectionState::StreamFile {
                response: Response::file(file, len, mime::resolve(&name)),
                len,
            },
            Resource::Directory | Resource::Absent => {
                ConnectionState::EmitError(Response::not_found())
            }
            Resource::Unreadable => ConnectionState::EmitError(Response::forbidden()),
        }
    }
}
