//! # httparse_stream
//!
//! A **strict, streaming HTTP/1.x message parser** implemented as a state
//! machine, designed for use both as a Rust library and as a CLI tool.
//!
//! The parser processes both requests and responses incrementally
//! (byte-by-byte or in arbitrarily-sized chunks), making it suitable for
//! both synchronous and asynchronous transports. It follows **RFC 9112**
//! strictly and supports **chunked transfer encoding**, pipelined
//! messages, and configurable limits.
//!
//! ## Quick start — one-shot parsing
//!
//! ```rust
//! use httparse_stream::parse_request;
//!
//! let raw = b"GET /hello HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let message = parse_request(raw).expect("valid request");
//! assert!(message.is_request());
//! ```
//!
//! ## Quick start — incremental parsing
//!
//! ```rust
//! use httparse_stream::Parser;
//!
//! let mut parser = Parser::new();
//!
//! let messages = parser.parse(b"GET / HTTP/1.1\r\n");
//! assert!(messages.is_empty());
//!
//! let messages = parser.parse(b"Host: example.com\r\n\r\n");
//! assert_eq!(messages.len(), 1);
//! ```

mod builder;
mod error;
mod headers;
mod message;
mod output;
mod parser;
mod startline;
mod validators;

pub use builder::{build_request, build_response, reason_phrase};
pub use error::{ParserError, ParserErrorCode, ParserState};
pub use headers::{parse_header_block, parse_headers, split_header_line, HeaderBlockLimits, HeaderMap};
pub use message::{Message, Method, RequestLine, StatusLine, TransferEncoding, Version};
pub use output::{format_debug, format_headers_only, format_json};
pub use parser::{Parser, ParserConfig};
pub use startline::{parse_request_line, parse_status_line, StartLineResult};

/// Parse a **complete** HTTP request from a byte slice in one call.
///
/// This is a convenience wrapper around [`Parser`]. For incremental /
/// streaming use-cases, create a `Parser` directly.
///
/// # Errors
///
/// Returns [`ParserError`] if the data is malformed or does not contain a
/// complete request.
pub fn parse_request(data: &[u8]) -> Result<Message, ParserError> {
    parse_one(data, ParserConfig::default())
}

/// Parse a **complete** HTTP response from a byte slice in one call.
///
/// # Errors
///
/// Returns [`ParserError`] if the data is malformed or does not contain a
/// complete response.
pub fn parse_response(data: &[u8]) -> Result<Message, ParserError> {
    parse_one(data, ParserConfig::default())
}

/// Parse a **complete** HTTP message (request or response) using custom
/// [`ParserConfig`] limits.
///
/// # Errors
///
/// Returns [`ParserError`] if the data is malformed, incomplete, or
/// exceeds the configured limits.
pub fn parse_with_config(data: &[u8], config: ParserConfig) -> Result<Message, ParserError> {
    parse_one(data, config)
}

fn parse_one(data: &[u8], config: ParserConfig) -> Result<Message, ParserError> {
    let mut parser = Parser::with_config(config);
    let mut messages = parser.parse(data);
    if let Some(err) = parser.last_error() {
        return Err(err.clone());
    }
    match messages.pop() {
        Some(message) => Ok(message),
        None => Err(ParserError::new(
            ParserErrorCode::Unknown,
            "input did not contain a complete message",
            parser.state(),
        )),
    }
}
