use bytes::Bytes;
use tokio::fs::File;

/// HTTP status codes the server can answer with.
///
/// - `Ok` (200): File found and streamed
/// - `Forbidden` (403): File exists but cannot be read
/// - `NotFound` (404): Nothing servable at the path
/// - `NotImplemented` (501): Method other than GET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// Sentence shown on the error page, `None` for success.
    fn explanation(&self) -> Option<&'static str> {
        match self {
            StatusCode::Ok => None,
            StatusCode::Forbidden => Some("The resource that you requested cannot be read by you."),
            StatusCode::NotFound => {
                Some("The resource that you requested does not exist on this server.")
            }
            StatusCode::NotImplemented => Some("The requested method is not implemented."),
        }
    }
}

/// Response payload.
#[derive(Debug)]
pub enum Body {
    Empty,
    /// In-memory bytes (error pages)
    Bytes(Bytes),
    /// An opened file and the number of bytes to stream from it
    File { file: File, len: u64 },
}

/// A complete HTTP response ready to be written.
///
/// Headers keep their insertion order. A response is consumed by the
/// writer, so nothing can change once emission has started.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Connection", "close")
///     .header("Content-Type", "text/plain")
///     .body(Body::Bytes(Bytes::from_static(b"hi")))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Body,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Appends a header. Headers are written in the order they are added.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A 200 response streaming `len` bytes of `file`. Length-delimited.
    pub fn file(file: File, len: u64, content_type: &str) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Connection", "close")
            .header("Content-Length", len.to_string())
            .header("Content-Type", content_type)
            .body(Body::File { file, len })
            .build()
    }

    /// 403 Forbidden error page.
    pub fn forbidden() -> Self {
        Self::error_page(StatusCode::Forbidden)
    }

    /// 404 Not Found error page.
    pub fn not_found() -> Self {
        Self::error_page(StatusCode::NotFound)
    }

    /// 501 Not Implemented error page.
    pub fn not_implemented() -> Self {
        Self::error_page(StatusCode::NotImplemented)
    }

    // Error pages carry no Content-Length: the body ends when the connection
    // closes.
    fn error_page(status: StatusCode) -> Self {
        let explanation = status.explanation().unwrap_or_default();
        let html = format!(
            "<html><head><title>Error</title></head><body>\
             <h2>Error: {} {}</h2><p>{}</p></body></html>",
            status.as_u16(),
            status.reason_phrase(),
            explanation
        );

        ResponseBuilder::new(status)
            .header("Connection", "close")
            .header("Content-Type", "text/html")
            .body(Body::Bytes(Bytes::from(html)))
            .build()
    }

    /// Looks up the first header named `key` (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
