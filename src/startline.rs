//! Buffer-oriented start-line tokenizers (§4.2).
//!
//! These operate over a full byte slice and return a three-state result:
//! parsed, needs more data, or invalid. The streaming parser inlines an
//! equivalent byte-at-a-time scan for its hot path (see DESIGN.md) — the
//! one-shot entry points (`parse_request`, `parse_response`,
//! `parse_with_config`) go through that streaming `Parser`, not through
//! these functions. These exist as the independently testable component
//! the spec calls for, and are exported for callers who want to tokenize a
//! single, already-buffered start-line directly.

use crate::message::{Method, RequestLine, StatusLine, Version};
use crate::validators;

/// Outcome of a start-line tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLineResult<T> {
    /// The line was fully parsed; `consumed` is the byte count including
    /// the trailing CRLF.
    Parsed { value: T, consumed: usize },
    /// Not enough bytes were available to reach a decision yet.
    NeedMoreData,
    /// The bytes present are not a valid start-line.
    Invalid(&'static str),
}

/// Parse a request-line: `METHOD SP TARGET SP VERSION CRLF`.
pub fn parse_request_line(data: &[u8]) -> StartLineResult<RequestLine> {
    let Some(line_end) = find_crlf(data) else {
        return StartLineResult::NeedMoreData;
    };
    let line = &data[..line_end];

    let Some(sp1) = line.iter().position(|&b| b == b' ') else {
        return StartLineResult::Invalid("missing SP after method");
    };
    let Some(sp2_rel) = line[sp1 + 1..].iter().position(|&b| b == b' ') else {
        return StartLineResult::Invalid("missing SP after target");
    };
    let sp2 = sp1 + 1 + sp2_rel;

    let method_bytes = &line[..sp1];
    let target_bytes = &line[sp1 + 1..sp2];
    let version_bytes = &line[sp2 + 1..];

    let method = match Method::parse(method_bytes) {
        Ok(m) => m,
        Err(_) => return StartLineResult::Invalid("invalid method"),
    };
    if !validators::validate_target(&String::from_utf8_lossy(target_bytes), 8192) {
        return StartLineResult::Invalid("invalid request target");
    }
    let version = match Version::parse(version_bytes) {
        Ok(v) => v,
        Err(_) => return StartLineResult::Invalid("invalid HTTP version"),
    };

    StartLineResult::Parsed {
        value: RequestLine {
            method,
            target: String::from_utf8_lossy(target_bytes).into_owned(),
            version,
        },
        consumed: line_end + 2,
    }
}

/// Parse a status-line: `VERSION SP STATUS-CODE SP REASON CRLF`. The SP
/// before the reason phrase (and the reason phrase itself) may be absent,
/// in which case the reason is empty.
pub fn parse_status_line(data: &[u8]) -> StartLineResult<StatusLine> {
    let Some(line_end) = find_crlf(data) else {
        return StartLineResult::NeedMoreData;
    };
    let line = &data[..line_end];

    let Some(sp1) = line.iter().position(|&b| b == b' ') else {
        return StartLineResult::Invalid("missing SP after version");
    };
    let version_bytes = &line[..sp1];
    let version = match Version::parse(version_bytes) {
        Ok(v) => v,
        Err(_) => return StartLineResult::Invalid("invalid HTTP version"),
    };

    let rest = &line[sp1 + 1..];
    let (code_bytes, reason_bytes) = match rest.iter().position(|&b| b == b' ') {
        Some(sp2_rel) => (&rest[..sp2_rel], &rest[sp2_rel + 1..]),
        None => (rest, &rest[rest.len()..]),
    };

    let Some(status_code) = validators::validate_status_code_bytes(code_bytes) else {
        return StartLineResult::Invalid("invalid status code");
    };

    if !reason_bytes.iter().all(|&b| validators::is_header_value_byte(b)) {
        return StartLineResult::Invalid("invalid byte in reason phrase");
    }

    StartLineResult::Parsed {
        value: StatusLine {
            version,
            status_code,
            reason: String::from_utf8_lossy(reason_bytes).into_owned(),
        },
        consumed: line_end + 2,
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_request_line() {
        let result = parse_request_line(b"GET /foo HTTP/1.1\r\nHost: h\r\n\r\n");
        match result {
            StartLineResult::Parsed { value, consumed } => {
                assert_eq!(value.method.as_str(), "GET");
                assert_eq!(value.target, "/foo");
                assert_eq!(value.version, Version::Http11);
                assert_eq!(consumed, 20);
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn needs_more_data_without_crlf() {
        assert_eq!(parse_request_line(b"GET /foo HTTP/1.1"), StartLineResult::NeedMoreData);
    }

    #[test]
    fn parses_status_line_with_reason() {
        let result = parse_status_line(b"HTTP/1.1 404 Not Found Here\r\n");
        match result {
            StartLineResult::Parsed { value, .. } => {
                assert_eq!(value.status_code, 404);
                assert_eq!(value.reason, "Not Found Here");
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn parses_status_line_with_empty_reason() {
        let result = parse_status_line(b"HTTP/1.1 204 \r\n");
        match result {
            StartLineResult::Parsed { value, .. } => {
                assert_eq!(value.status_code, 204);
                assert_eq!(value.reason, "");
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_version() {
        assert!(matches!(
            parse_status_line(b"HTTP/2.0 200 OK\r\n"),
            StartLineResult::Invalid(_)
        ));
    }

    #[test]
    fn rejects_obs_text_in_reason_phrase() {
        assert!(matches!(
            parse_status_line(b"HTTP/1.1 200 hello\x80world\r\n"),
            StartLineResult::Invalid(_)
        ));
    }
}
