use crate::message::Message;

/// Serialize a [`Message`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(message: &Message, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(message).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    } else {
        serde_json::to_string(message).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Render a [`Message`] in a human-readable debug format.
pub fn format_debug(message: &Message) -> String {
    let mut out = String::with_capacity(256);

    match message {
        Message::Request { line, .. } => {
            out.push_str("=== HTTP Request ===\n");
            out.push_str(&format!("Method:  {}\n", line.method));
            out.push_str(&format!("Target:  {}\n", line.target));
            out.push_str(&format!("Version: {}\n", line.version));
        }
        Message::Response { line, .. } => {
            out.push_str("=== HTTP Response ===\n");
            out.push_str(&format!("Version: {}\n", line.version));
            out.push_str(&format!("Status:  {} {}\n", line.status_code, line.reason));
        }
    }

    let headers = message.headers();
    out.push_str(&format!("\n--- Headers ({}) ---\n", headers.size()));
    for (name, value) in headers.iter() {
        out.push_str(&format!("  {name}: {value}\n"));
    }

    let body = message.body();
    if body.is_empty() {
        out.push_str("\n--- No Body ---\n");
    } else {
        out.push_str(&format!("\n--- Body ({} bytes) ---\n", body.len()));
        match std::str::from_utf8(body) {
            Ok(s) => out.push_str(s),
            Err(_) => out.push_str(&format!("<binary data: {} bytes>", body.len())),
        }
        out.push('\n');
    }

    out.push_str("====================\n");
    out
}

/// Render only the start-line and headers (no body).
pub fn format_headers_only(message: &Message) -> String {
    let headers = message.headers();
    let mut out = String::with_capacity(64 + headers.total_entries() * 40);

    match message {
        Message::Request { line, .. } => {
            out.push_str(&format!("{} {} {}\n", line.method, line.target, line.version));
        }
        Message::Response { line, .. } => {
            out.push_str(&format!("{} {} {}\n", line.version, line.status_code, line.reason));
        }
    }

    for (name, value) in headers.iter() {
        out.push_str(&format!("{name}: {value}\n"));
    }

    out
}
