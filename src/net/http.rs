// Copyright (c) 2026 Spring83
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Minimal HTTP/1.1 request parsing and response serialization over a
//! slot's byte buffer. Chunked transfer encoding is not supported.

use thiserror::Error;

const MAX_HEADERS: usize = 32;

/// Parse failures: malformed request line or header grammar.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("malformed http request")]
pub struct HttpError;

/// Result of attempting to parse a byte buffer as a request.
pub enum ParseOutcome<'a> {
    /// Not enough bytes have arrived yet; keep reading.
    Incomplete,
    /// A full request, with its body bounded by `Content-Length`.
    Complete(Request<'a>),
}

/// A parsed HTTP/1.1 request. `method` and `path` borrow from the input
/// buffer; headers are copied out as owned strings since there are only
/// ever a handful of them.
pub struct Request<'a> {
    /// Request method, e.g. `"GET"`.
    pub method: &'a str,
    /// Request target, e.g. `"/deadbeef"`.
    pub path: &'a str,
    /// Request body, bounded by the `Content-Length` header (`0` if absent).
    pub body: &'a [u8],
    headers: Vec<(String, String)>,
}

impl<'a> Request<'a> {
    /// Case-insensitive header lookup; first matching value wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Parse a request from the bytes accumulated so far in a slot's read
/// buffer. Returns `Incomplete` if the header block or body hasn't fully
/// arrived; returns `Err` only for bytes that can never form a valid
/// request regardless of how much more arrives.
pub fn parse(buf: &[u8]) -> Result<ParseOutcome<'_>, HttpError> {
    let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Request::new(&mut raw_headers);

    let header_end = match parsed.parse(buf) {
        Ok(httparse::Status::Complete(n)) => n,
        Ok(httparse::Status::Partial) => return Ok(ParseOutcome::Incomplete),
        Err(_) => return Err(HttpError),
    };

    let method = parsed.method.ok_or(HttpError)?;
    let path = parsed.path.ok_or(HttpError)?;
    let headers: Vec<(String, String)> = parsed
        .headers
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_end = header_end.checked_add(content_length).ok_or(HttpError)?;
    if buf.len() < body_end {
        return Ok(ParseOutcome::Incomplete);
    }

    Ok(ParseOutcome::Complete(Request {
        method,
        path,
        body: &buf[header_end..body_end],
        headers,
    }))
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// A response under construction; serialized into a slot's write buffer by
/// [`Response::write_into`].
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    suppress_content_length: bool,
}

impl Response {
    /// Start a response with the given status code and no headers or body.
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new(), suppress_content_length: false }
    }

    /// Append a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Omit the automatic `Content-Length` header (for bodyless statuses
    /// like `204` and `304`).
    pub fn no_content_length(mut self) -> Self {
        self.suppress_content_length = true;
        self
    }

    /// The response's status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Look up a header set via [`Response::with_header`] (exact-case match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Serialize the status line, headers, and body into `out`, replacing
    /// any prior contents.
    pub fn write_into(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status)).as_bytes());
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        if !self.suppress_content_length {
            out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_complete_request_with_body() {
        let raw = b"PUT /deadbeef HTTP/1.1\r\nSpring-Signature: ab\r\nContent-Length: 5\r\n\r\nhello";
        match parse(raw).unwrap() {
            ParseOutcome::Complete(req) => {
                assert_eq!(req.method, "PUT");
                assert_eq!(req.path, "/deadbeef");
                assert_eq!(req.body, b"hello");
                assert_eq!(req.header("spring-signature"), Some("ab"));
            }
            ParseOutcome::Incomplete => panic!("expected a complete request"),
        }
    }

    #[test]
    fn parse_reports_incomplete_on_partial_headers() {
        let raw = b"GET / HTTP/1.1\r\nHost: ex";
        assert!(matches!(parse(raw).unwrap(), ParseOutcome::Incomplete));
    }

    #[test]
    fn parse_reports_incomplete_while_body_still_arriving() {
        let raw = b"PUT /k HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        assert!(matches!(parse(raw).unwrap(), ParseOutcome::Incomplete));
    }

    #[test]
    fn parse_rejects_malformed_request_line() {
        let raw = b"NOT A REQUEST LINE AT ALL\r\n\r\n";
        assert!(parse(raw).is_err());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let raw = b"GET / HTTP/1.1\r\nIf-Modified-Since: 2024-01-01T00:00:00Z\r\n\r\n";
        match parse(raw).unwrap() {
            ParseOutcome::Complete(req) => {
                assert_eq!(req.header("if-modified-since"), Some("2024-01-01T00:00:00Z"));
            }
            ParseOutcome::Incomplete => panic!("expected a complete request"),
        }
    }

    #[test]
    fn response_write_into_formats_status_line_and_body() {
        let response = Response::new(200).with_header("X-Test", "1").with_body(b"hi".to_vec());
        let mut out = Vec::new();
        response.write_into(&mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("X-Test: 1\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("hi"));
    }

    #[test]
    fn no_content_length_omits_the_header() {
        let response = Response::new(204).no_content_length();
        let mut out = Vec::new();
        response.write_into(&mut out);
        assert!(!String::from_utf8(out).unwrap().contains("Content-Length"));
    }
}
