use crate::http::request::{Method, Request};

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Empty or whitespace-only line: the client sent no request at all
    Blank,
    /// Anything that is not exactly `METHOD PATH VERSION`
    Malformed,
}

/// Parses a request line of the form `METHOD PATH VERSION`.
///
/// The line may still carry its `\n` or `\r\n` terminator. Tokens are
/// separated by single spaces and there must be exactly three of them; the
/// path is returned verbatim, without decoding or normalization.
pub fn parse_request_line(line: &[u8]) -> Result<Request, ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::Malformed)?;
    let line = line
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line);

    if line.trim().is_empty() {
        return Err(ParseError::Blank);
    }

    let mut parts = line.split(' ');

    let method = parts.next().filter(|t| !t.is_empty()).ok_or(ParseError::Malformed)?;
    let path = parts.next().filter(|t| !t.is_empty()).ok_or(ParseError::Malformed)?;
    let version = parts.next().filter(|t| !t.is_empty()).ok_or(ParseError::Malformed)?;

    if parts.next().is_some() {
        return Err(ParseError::Malformed);
    }

    Ok(Request {
        method: Method::from_token(method),
        path: path.to_string(),
        version: version.to_string(),
    })
}

/// Position of the first `\n` in `buf`, if the request line is complete.
pub fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}
