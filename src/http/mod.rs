//! HTTP protocol implementation.
//!
//! This module implements the server side of a small HTTP/1.1 subset: one
//! `GET` per connection, answered from the document root and followed by a
//! close.
//!
//! # Architecture
//!
//! - **`connection`**: The per-client handler implementing the request-response state machine
//! - **`parser`**: Parses the request line
//! - **`request`**: Request line representation
//! - **`resource`**: Maps request paths onto the document root and classifies them
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitRequestLine │ ← Read the first line (EOF / blank → Closed)
//!        └──────┬───────────┘
//!               │ Request parsed (malformed → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │ ClassifyResource │ ← file / directory / absent / unreadable
//!        └──────┬───────────┘
//!               ├─ regular file      → StreamFile (200)
//!               └─ everything else   → EmitError (403 / 404 / 501)
//!                                         │
//!                                         ▼
//!                                       Closed
//! ```
//!
//! Success responses are length-delimited. Error pages carry no
//! `Content-Length` and end when the connection closes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docroot::http::connection::{Connection, ConnectionSettings};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let settings = Arc::new(ConnectionSettings::new("./public"));
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let settings = settings.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, settings);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod resource;
pub mod response;
pub mod writer;
