use std::fmt;

/// Coarse lifecycle state of a [`crate::Parser`], as seen from the outside.
///
/// Mirrors the state machine driving [`crate::Parser::parse`]: every call
/// leaves the parser in exactly one of these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// No bytes belonging to a message have been seen yet.
    Idle,
    /// Scanning the request-line (`METHOD SP TARGET SP VERSION CRLF`).
    RequestLine,
    /// Scanning the status-line (`VERSION SP STATUS SP REASON CRLF`).
    StatusLine,
    /// Scanning header fields up to the terminating empty line.
    Headers,
    /// Accumulating a fixed-length body per `Content-Length`.
    BodyContentLength,
    /// Scanning a chunk-size line.
    BodyChunkedSize,
    /// Accumulating the bytes of the current chunk.
    BodyChunkedData,
    /// Scanning the trailer section after the terminating zero-size chunk.
    BodyChunkedTrailer,
    /// A full message has been parsed and is ready to be taken.
    Complete,
    /// Parsing failed; terminal until [`crate::Parser::reset`] is called.
    Error,
}

/// Stable error codes for every way parsing can fail.
///
/// `Timeout` and `ConnectionClosed` are never produced by this crate itself
/// (the core does no I/O — see the crate's scope notes) but are kept in the
/// enum so a transport layer wrapping this parser can report its own
/// failures through the same type as parser failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErrorCode {
    InvalidMethod,
    InvalidVersion,
    InvalidTarget,
    InvalidStatusCode,
    InvalidHeader,
    HeaderNameTooLong,
    HeaderValueTooLong,
    TooManyHeaders,
    InvalidContentLength,
    BodyTooLarge,
    InvalidChunkSize,
    IncompleteChunk,
    InvalidChunkTrailer,
    Timeout,
    ConnectionClosed,
    Unknown,
}

impl ParserErrorCode {
    /// A short, stable machine-readable name, e.g. for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidMethod => "INVALID_METHOD",
            Self::InvalidVersion => "INVALID_VERSION",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::InvalidStatusCode => "INVALID_STATUS_CODE",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::HeaderNameTooLong => "HEADER_NAME_TOO_LONG",
            Self::HeaderValueTooLong => "HEADER_VALUE_TOO_LONG",
            Self::TooManyHeaders => "TOO_MANY_HEADERS",
            Self::InvalidContentLength => "INVALID_CONTENT_LENGTH",
            Self::BodyTooLarge => "BODY_TOO_LARGE",
            Self::InvalidChunkSize => "INVALID_CHUNK_SIZE",
            Self::IncompleteChunk => "INCOMPLETE_CHUNK",
            Self::InvalidChunkTrailer => "INVALID_CHUNK_TRAILER",
            Self::Timeout => "TIMEOUT",
            Self::ConnectionClosed => "CONNECTION_CLOSED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ParserErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while parsing an HTTP/1.x message.
///
/// Carries the error code, a human-readable message, the parser state the
/// failure arose in, and — when known — the byte offset and a free-form
/// detail string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub code: ParserErrorCode,
    pub message: String,
    pub state: ParserState,
    pub position: Option<usize>,
    pub detail: Option<String>,
}

impl ParserError {
    pub fn new(code: ParserErrorCode, message: impl Into<String>, state: ParserState) -> Self {
        Self {
            code,
            message: message.into(),
            state,
            position: None,
            detail: None,
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (state {:?}", self.code, self.message, self.state)?;
        if let Some(pos) = self.position {
            write!(f, ", at byte {pos}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ", detail: {detail}")?;
        }
        write!(f, ")")
    }
}

impl std::error::Error for ParserError {}
