use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Buffer size for copying file bodies onto the socket
const BUFFER_SIZE: usize = 8192;

fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers, in insertion order
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes one response onto a stream: head first, then the body.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Body,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self {
            head: serialize_head(&response),
            body: response.body,
        }
    }

    /// Writes the response and flushes. Returns the number of body bytes
    /// written.
    ///
    /// For file bodies at most the declared length is copied. A file that
    /// shrank after it was opened yields a short body rather than an error.
    pub async fn write_to_stream<W>(self, stream: &mut W) -> std::io::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut out = BufWriter::with_capacity(BUFFER_SIZE, stream);
        out.write_all(&self.head).await?;

        let written = match self.body {
            Body::Empty => 0,
            Body::Bytes(bytes) => {
                out.write_all(&bytes).await?;
                bytes.len() as u64
            }
            Body::File { file, len } => {
                let mut limited = file.take(len);
                tokio::io::copy(&mut limited, &mut out).await?
            }
        };

        out.flush().await?;
        Ok(written)
    }
}
