use std::io;
use thiserror::Error;

/// Failures of the listening endpoint. Both are fatal for the process.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failures local to one connection. These end the connection and nothing else.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("malformed request line")]
    Malformed,

    #[error("read error: {0}")]
    Read(#[source] io::Error),

    #[error("timed out waiting for request line")]
    Timeout,

    #[error("write error: {0}")]
    Write(#[source] io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;
