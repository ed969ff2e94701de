use httparse_stream::{parse_response, Message, TransferEncoding, Version};

fn status_line(message: &Message) -> (Version, u16, &str) {
    match message {
        Message::Response { line, .. } => (line.version, line.status_code, line.reason.as_str()),
        Message::Request { .. } => panic!("expected a response"),
    }
}

#[test]
fn simple_200_ok() {
    let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    let (version, code, reason) = status_line(&resp);
    assert_eq!(version, Version::Http11);
    assert_eq!(code, 200);
    assert_eq!(reason, "OK");
    assert!(resp.is_response());
    assert!(resp.body().is_empty());
}

#[test]
fn status_line_with_multi_word_reason() {
    let raw = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    let (_, code, reason) = status_line(&resp);
    assert_eq!(code, 404);
    assert_eq!(reason, "Not Found");
}

#[test]
fn status_line_with_empty_reason_is_allowed() {
    let raw = b"HTTP/1.1 200 \r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    let (_, _, reason) = status_line(&resp);
    assert_eq!(reason, "");
}

#[test]
fn http_10_response() {
    let raw = b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    let (version, ..) = status_line(&resp);
    assert_eq!(version, Version::Http10);
    assert!(!resp.keep_alive());
}

#[test]
fn response_with_content_length_body() {
    let body = "hello world";
    let raw = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let resp = parse_response(raw.as_bytes()).expect("should parse");
    assert_eq!(resp.body_as_str(), Some(body));
}

#[test]
fn response_with_chunked_body() {
    let raw = b"HTTP/1.1 200 OK\r\n\
        Transfer-Encoding: chunked\r\n\r\n\
        4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    assert_eq!(resp.body_as_str(), Some("Wikipedia"));
    assert_eq!(resp.transfer_encoding(), TransferEncoding::Chunked);
}

#[test]
fn informational_1xx_status() {
    let raw = b"HTTP/1.1 100 Continue\r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    let (_, code, _) = status_line(&resp);
    assert_eq!(code, 100);
}

#[test]
fn redirect_3xx_status_with_location() {
    let raw = b"HTTP/1.1 301 Moved Permanently\r\nLocation: https://example.com/new\r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    assert_eq!(resp.headers().get("Location"), Some("https://example.com/new".to_string()));
}

#[test]
fn server_error_5xx_status() {
    let raw = b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    let (_, code, reason) = status_line(&resp);
    assert_eq!(code, 503);
    assert_eq!(reason, "Service Unavailable");
}

#[test]
fn connection_close_on_response_overrides_keep_alive() {
    let raw = b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 0\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    assert!(!resp.keep_alive());
}

#[test]
fn error_invalid_status_code_out_of_range() {
    let raw = b"HTTP/1.1 1000 Bad\r\nContent-Length: 0\r\n\r\n";
    assert!(parse_response(raw).is_err());
}

#[test]
fn error_non_numeric_status_code() {
    let raw = b"HTTP/1.1 abc Bad\r\nContent-Length: 0\r\n\r\n";
    assert!(parse_response(raw).is_err());
}

#[test]
fn error_invalid_version_in_status_line() {
    let raw = b"HTTP/9.9 200 OK\r\nContent-Length: 0\r\n\r\n";
    assert!(parse_response(raw).is_err());
}

#[test]
fn sniffing_falls_back_to_request_when_not_http_prefixed() {
    // "HTTQ" fails the "HTTP" sniff after three matching bytes, so the
    // parser falls back to treating the whole token as an extension method.
    let raw = b"HTTQ / HTTP/1.1\r\nHost: h\r\n\r\n";
    let message = parse_response(raw).expect("should parse as a request");
    assert!(message.is_request());
}

#[test]
fn response_without_content_length_or_chunked_has_empty_body() {
    let raw = b"HTTP/1.1 204 No Content\r\n\r\n";
    let resp = parse_response(raw).expect("should parse");
    assert!(resp.body().is_empty());
}

#[test]
fn pipelined_responses() {
    use httparse_stream::Parser;
    let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\nHTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
    let mut parser = Parser::new();
    let messages = parser.parse(raw);
    assert_eq!(messages.len(), 2);
    let (_, code1, _) = status_line(&messages[0]);
    let (_, code2, _) = status_line(&messages[1]);
    assert_eq!(code1, 200);
    assert_eq!(code2, 404);
}
