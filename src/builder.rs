//! Wire-format builder helpers (§6): assemble a request or response byte
//! buffer from its parts, the inverse of [`crate::Parser`].
//!
//! These are free functions rather than methods on [`crate::Message`]
//! because a caller building a message rarely has (or wants) a fully
//! parsed `Message` on hand — just a method, a target, and some headers.

use crate::headers::HeaderMap;
use crate::message::Version;

/// Assemble a complete request: request-line, headers, and body.
///
/// `headers` is written in its own iteration order. If it does not already
/// contain `Content-Length` and `body` is non-empty, a `Content-Length`
/// entry is appended so the parser can frame the body back out (§6).
pub fn build_request(method: &str, target: &str, version: Version, headers: &HeaderMap, body: &[u8]) -> Vec<u8> {
    let headers = with_content_length(headers, body);
    let mut out = Vec::with_capacity(64 + headers.total_entries() * 32 + body.len());
    out.extend_from_slice(method.as_bytes());
    out.push(b' ');
    out.extend_from_slice(target.as_bytes());
    out.push(b' ');
    out.extend_from_slice(version.as_str().as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&headers.to_bytes());
    out.extend_from_slice(body);
    out
}

/// Assemble a complete response: status-line, headers, and body.
///
/// When `reason` is `None`, the IANA reason phrase for `status_code` is
/// looked up via [`reason_phrase`]; unknown codes fall back to an empty
/// reason phrase, which is valid per §4.2. If `headers` does not already
/// contain `Content-Length` and `body` is non-empty, a `Content-Length`
/// entry is appended so the parser can frame the body back out (§6).
pub fn build_response(
    version: Version,
    status_code: u16,
    reason: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Vec<u8> {
    let reason = reason.unwrap_or_else(|| reason_phrase(status_code).unwrap_or(""));
    let headers = with_content_length(headers, body);
    let mut out = Vec::with_capacity(64 + headers.total_entries() * 32 + body.len());
    out.extend_from_slice(version.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(status_code.to_string().as_bytes());
    out.push(b' ');
    out.extend_from_slice(reason.as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&headers.to_bytes());
    out.extend_from_slice(body);
    out
}

/// Clone `headers`, adding a `Content-Length` entry for `body` unless one
/// is already present or `body` is empty.
fn with_content_length(headers: &HeaderMap, body: &[u8]) -> HeaderMap {
    if body.is_empty() || headers.get("Content-Length").is_some() {
        return headers.clone();
    }
    let mut headers = headers.clone();
    headers.append("Content-Length", body.len().to_string());
    headers
}

/// The standard IANA reason phrase for a status code, if it is one of the
/// registered codes.
pub fn reason_phrase(status_code: u16) -> Option<&'static str> {
    Some(match status_code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Content Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a Teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Content",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_round_trips_through_the_parser() {
        let mut headers = HeaderMap::new();
        headers.append("Host", "example.com");
        headers.append("Content-Length", "5");
        let raw = build_request("POST", "/submit", Version::Http11, &headers, b"hello");

        let mut parser = crate::Parser::new();
        let messages = parser.parse(&raw);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_request());
        assert_eq!(messages[0].body(), b"hello");
    }

    #[test]
    fn build_request_infers_content_length_when_absent() {
        let mut headers = HeaderMap::new();
        headers.append("Host", "example.com");
        let raw = build_request("POST", "/submit", Version::Http11, &headers, b"hello");

        let text = String::from_utf8_lossy(&raw);
        assert!(text.contains("Content-Length: 5\r\n"));

        let mut parser = crate::Parser::new();
        let messages = parser.parse(&raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body(), b"hello");
    }

    #[test]
    fn build_request_does_not_duplicate_explicit_content_length() {
        let mut headers = HeaderMap::new();
        headers.append("Content-Length", "5");
        let raw = build_request("POST", "/", Version::Http11, &headers, b"hello");
        let text = String::from_utf8_lossy(&raw);
        assert_eq!(text.matches("Content-Length").count(), 1);
    }

    #[test]
    fn build_response_infers_content_length_when_absent() {
        let headers = HeaderMap::new();
        let raw = build_response(Version::Http11, 200, None, &headers, b"ok");

        let text = String::from_utf8_lossy(&raw);
        assert!(text.contains("Content-Length: 2\r\n"));

        let mut parser = crate::Parser::new();
        let messages = parser.parse(&raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body(), b"ok");
    }

    #[test]
    fn build_response_fills_in_reason_phrase() {
        let headers = HeaderMap::new();
        let raw = build_response(Version::Http11, 404, None, &headers, b"");
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn build_response_honors_explicit_reason() {
        let headers = HeaderMap::new();
        let raw = build_response(Version::Http11, 200, Some("Custom"), &headers, b"");
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.1 200 Custom\r\n"));
    }

    #[test]
    fn unregistered_status_code_falls_back_to_empty_reason() {
        assert_eq!(reason_phrase(799), None);
        let headers = HeaderMap::new();
        let raw = build_response(Version::Http11, 799, None, &headers, b"");
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.1 799 \r\n"));
    }
}
