use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::ParserErrorCode;
use crate::headers::HeaderMap;
use crate::validators;

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

/// A validated HTTP request method token.
///
/// Unlike a closed enum of the nine standard methods, this wraps any token
/// string that passes [`validators::validate_method`] — extension methods
/// (`PROPFIND`, `PURGE`, ...) are first-class, not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Method(String);

impl Method {
    /// Parse and validate a method token (default 100-byte cap).
    pub fn parse(bytes: &[u8]) -> Result<Self, ParserErrorCode> {
        Self::parse_with_max_len(bytes, 100)
    }

    pub fn parse_with_max_len(bytes: &[u8], max_len: usize) -> Result<Self, ParserErrorCode> {
        if !validators::validate_method(bytes, max_len) {
            return Err(ParserErrorCode::InvalidMethod);
        }
        Ok(Self(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_standard(&self) -> bool {
        matches!(
            self.0.as_str(),
            "GET" | "HEAD" | "POST" | "PUT" | "DELETE" | "CONNECT" | "OPTIONS" | "TRACE" | "PATCH"
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// HttpVersion
// ---------------------------------------------------------------------------

/// HTTP protocol version — exactly `HTTP/1.0` or `HTTP/1.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    Http10,
    Http11,
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Version {
    pub fn parse(bytes: &[u8]) -> Result<Self, ParserErrorCode> {
        match bytes {
            b"HTTP/1.0" => Ok(Self::Http10),
            b"HTTP/1.1" => Ok(Self::Http11),
            _ => Err(ParserErrorCode::InvalidVersion),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Start-lines
// ---------------------------------------------------------------------------

/// A parsed request-line: `METHOD SP TARGET SP VERSION CRLF`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: Version,
}

/// A parsed status-line: `VERSION SP STATUS-CODE SP REASON CRLF`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub version: Version,
    pub status_code: u16,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Transfer encoding
// ---------------------------------------------------------------------------

/// How the message body is framed, decided once the header block is
/// complete (RFC 9112 §6.1/§6.3 precedence: chunked beats Content-Length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferEncoding {
    ContentLength,
    Chunked,
    Identity,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A fully parsed HTTP/1.x message — either a request or a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Request {
        line: RequestLine,
        headers: HeaderMap,
        #[serde(serialize_with = "serialize_body")]
        body: Vec<u8>,
        keep_alive: bool,
        transfer_encoding: TransferEncoding,
        content_length: Option<usize>,
    },
    Response {
        line: StatusLine,
        headers: HeaderMap,
        #[serde(serialize_with = "serialize_body")]
        body: Vec<u8>,
        keep_alive: bool,
        transfer_encoding: TransferEncoding,
        content_length: Option<usize>,
    },
}

/// Serialize body bytes as a lossy UTF-8 string for JSON output, matching
/// how the teacher's `HttpRequest` rendered its body.
fn serialize_body<S: Serializer>(body: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(body))
}

impl Message {
    pub fn headers(&self) -> &HeaderMap {
        match self {
            Message::Request { headers, .. } | Message::Response { headers, .. } => headers,
        }
    }

    pub fn body(&self) -> &[u8] {
        match self {
            Message::Request { body, .. } | Message::Response { body, .. } => body,
        }
    }

    pub fn keep_alive(&self) -> bool {
        match self {
            Message::Request { keep_alive, .. } | Message::Response { keep_alive, .. } => {
                *keep_alive
            }
        }
    }

    pub fn transfer_encoding(&self) -> TransferEncoding {
        match self {
            Message::Request {
                transfer_encoding, ..
            }
            | Message::Response {
                transfer_encoding, ..
            } => *transfer_encoding,
        }
    }

    pub fn version(&self) -> Version {
        match self {
            Message::Request { line, .. } => line.version,
            Message::Response { line, .. } => line.version,
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request { .. })
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Message::Response { .. })
    }

    /// Return the body as a UTF-8 `&str` if it is valid UTF-8.
    pub fn body_as_str(&self) -> Option<&str> {
        let body = self.body();
        if body.is_empty() {
            None
        } else {
            std::str::from_utf8(body).ok()
        }
    }

    /// Return the body as a lossy UTF-8 string, or `None` if empty.
    pub fn body_as_lossy_string(&self) -> Option<String> {
        let body = self.body();
        if body.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(body).into_owned())
        }
    }
}
