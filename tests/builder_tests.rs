use httparse_stream::{build_request, build_response, parse_request, parse_response, HeaderMap, Version};

#[test]
fn build_request_produces_well_formed_wire_bytes() {
    let mut headers = HeaderMap::new();
    headers.append("Host", "example.com");
    headers.append("Content-Length", "5");

    let raw = build_request("POST", "/submit", Version::Http11, &headers, b"hello");
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("POST /submit HTTP/1.1\r\n"));
    assert!(text.contains("Host: example.com\r\n"));
    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("hello"));
}

#[test]
fn build_request_round_trips_with_duplicate_headers() {
    let mut headers = HeaderMap::new();
    headers.append("Host", "example.com");
    headers.append("X-Tag", "a");
    headers.append("X-Tag", "b");

    let raw = build_request("GET", "/", Version::Http11, &headers, b"");
    let message = parse_request(&raw).expect("should round trip");
    assert_eq!(message.headers().get_all("X-Tag"), vec!["a", "b"]);
}

#[test]
fn build_response_round_trips_through_parse_response() {
    let mut headers = HeaderMap::new();
    headers.append("Content-Type", "text/plain");
    headers.append("Content-Length", "2");

    let raw = build_response(Version::Http11, 200, None, &headers, b"ok");
    let message = parse_response(&raw).expect("should round trip");
    assert!(message.is_response());
    assert_eq!(message.body_as_str(), Some("ok"));
}

#[test]
fn build_response_without_body_has_empty_content_length_framing() {
    let headers = HeaderMap::new();
    let raw = build_response(Version::Http11, 204, None, &headers, b"");
    let text = String::from_utf8(raw).unwrap();
    assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[test]
fn build_request_with_http10_version() {
    let mut headers = HeaderMap::new();
    headers.append("Host", "h");
    let raw = build_request("GET", "/legacy", Version::Http10, &headers, b"");
    let text = String::from_utf8(raw).unwrap();
    assert!(text.starts_with("GET /legacy HTTP/1.0\r\n"));
}

#[test]
fn build_request_without_explicit_content_length_still_round_trips_body() {
    let mut headers = HeaderMap::new();
    headers.append("Host", "example.com");

    let raw = build_request("POST", "/submit", Version::Http11, &headers, b"a body");
    let message = parse_request(&raw).expect("should round trip");
    assert_eq!(message.body_as_str(), Some("a body"));
}

#[test]
fn build_response_without_explicit_content_length_still_round_trips_body() {
    let headers = HeaderMap::new();

    let raw = build_response(Version::Http11, 200, None, &headers, b"a body");
    let message = parse_response(&raw).expect("should round trip");
    assert_eq!(message.body_as_str(), Some("a body"));
}
