use log::{debug, warn};

use crate::error::{ParserError, ParserErrorCode, ParserState};
use crate::headers::HeaderMap;
use crate::message::{Message, Method, RequestLine, StatusLine, TransferEncoding, Version};
use crate::validators;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configurable limits and behavior switches for [`Parser`] (§6).
///
/// All sizes are in bytes unless stated otherwise.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Cap on header entries per message (default 256).
    pub max_headers: usize,
    /// Cap on any single header line, name+value (default 8192).
    pub max_header_line_length: usize,
    /// Cap on accumulated body bytes, both Content-Length and chunked
    /// (default 10 MiB).
    pub max_body_size: usize,
    /// Cap on chunks per chunked body (default 10000).
    pub max_chunks: usize,
    /// Enable the header-name validator during header parsing (default
    /// true).
    pub validate_header_names: bool,
    /// Enable the header-value validator during header parsing (default
    /// true).
    pub validate_header_values: bool,
    /// Treat `_` as a valid header-name character (default true).
    pub allow_underscore_in_headers: bool,
    /// Advisory only — the parser always handles pipelined bytes within one
    /// `parse` call regardless of this flag (default false).
    pub enable_pipelining: bool,
    /// Advisory only — not enforced by this crate; the caller's transport
    /// layer is responsible for timing out idle connections (default
    /// 30000ms).
    pub inactivity_timeout_ms: u64,
    /// Cap on a method token's length (default 100, per §4.1).
    pub max_method_len: usize,
    /// Cap on a request-target's length (default 8192, per §4.1).
    pub max_target_len: usize,
    /// Cap on a single header name's length (default 256, per §4.1).
    pub max_header_name_len: usize,
    /// Cap on a single header value's length (default 8192, per §4.1).
    pub max_header_value_len: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_headers: 256,
            max_header_line_length: 8192,
            max_body_size: 10 * 1024 * 1024,
            max_chunks: 10_000,
            validate_header_names: true,
            validate_header_values: true,
            allow_underscore_in_headers: true,
            enable_pipelining: false,
            inactivity_timeout_ms: 30_000,
            max_method_len: 100,
            max_target_len: 8192,
            max_header_name_len: 256,
            max_header_value_len: 8192,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal fine-grained state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Sniff,

    ReqMethod,
    ReqTarget,
    ReqVersion,
    ReqVersionLf,

    RespVersion,
    RespStatus,
    RespReason,
    RespReasonLf,

    HeaderStart,
    HeaderName,
    HeaderValueOws,
    HeaderValue,
    HeaderValueLf,
    EndHeadersLf,

    Body,

    ChunkSize,
    ChunkExt,
    ChunkSizeLf,
    ChunkData,
    ChunkDataCr,
    ChunkDataLf,

    TrailerStart,
    TrailerField,
    TrailerFieldLf,
    TrailerEndLf,

    Complete,
}

impl Phase {
    fn public_state(self) -> ParserState {
        match self {
            Phase::Sniff => ParserState::Idle,
            Phase::ReqMethod | Phase::ReqTarget | Phase::ReqVersion | Phase::ReqVersionLf => {
                ParserState::RequestLine
            }
            Phase::RespVersion | Phase::RespStatus | Phase::RespReason | Phase::RespReasonLf => {
                ParserState::StatusLine
            }
            Phase::HeaderStart
            | Phase::HeaderName
            | Phase::HeaderValueOws
            | Phase::HeaderValue
            | Phase::HeaderValueLf
            | Phase::EndHeadersLf => ParserState::Headers,
            Phase::Body => ParserState::BodyContentLength,
            Phase::ChunkSize | Phase::ChunkExt | Phase::ChunkSizeLf => {
                ParserState::BodyChunkedSize
            }
            Phase::ChunkData | Phase::ChunkDataCr | Phase::ChunkDataLf => {
                ParserState::BodyChunkedData
            }
            Phase::TrailerStart
            | Phase::TrailerField
            | Phase::TrailerFieldLf
            | Phase::TrailerEndLf => ParserState::BodyChunkedTrailer,
            Phase::Complete => ParserState::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Request,
    Response,
}

/// Outcome of processing one byte (or, on the bulk-copy body paths, a run of
/// bytes) from the input slice.
enum StepOutcome {
    Continue,
    NeedMoreData,
    MessageComplete,
    Error(ParserError),
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// An incremental HTTP/1.x message parser — requests and responses alike.
///
/// A single call to [`Parser::parse`] consumes as many complete messages as
/// the supplied bytes permit (supporting pipelining), returning them in
/// arrival order. Partial data is never an error: it is absorbed into the
/// parser's internal state and the next `parse` call picks up where the
/// last left off. Failures are terminal — recorded via [`Parser::state`]
/// and [`Parser::last_error`] — rather than returned from `parse` itself,
/// so bytes already turned into messages before a failing byte are never
/// lost (see DESIGN.md, "error surface").
///
/// # Example
///
/// ```rust
/// use httparse_stream::{Parser, ParserState};
///
/// let mut parser = Parser::new();
/// let messages = parser.parse(b"GET / HTTP/1.1\r\nHost: h\r\n\r\n");
/// assert_eq!(messages.len(), 1);
/// assert_eq!(parser.state(), ParserState::Idle);
/// ```
pub struct Parser {
    config: ParserConfig,
    phase: Phase,
    kind: Option<Kind>,

    sniff: Vec<u8>,

    method_buf: Vec<u8>,
    target_buf: Vec<u8>,
    version_buf: Vec<u8>,
    status_code_buf: Vec<u8>,
    header_name_buf: Vec<u8>,
    header_value_buf: Vec<u8>,
    chunk_size_buf: Vec<u8>,

    pending_method: Option<Method>,
    pending_target: Option<String>,
    pending_version: Option<Version>,
    pending_status_code: Option<u16>,

    request_line: Option<RequestLine>,
    status_line: Option<StatusLine>,
    headers: HeaderMap,
    header_count: usize,
    header_line_len: usize,

    body: Vec<u8>,
    body_remaining: usize,
    chunk_remaining: usize,
    chunk_count: usize,

    keep_alive: bool,
    transfer_encoding: TransferEncoding,
    content_length: Option<usize>,

    bytes_since_last_message: usize,
    last_error: Option<ParserError>,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            phase: Phase::Sniff,
            kind: None,
            sniff: Vec::with_capacity(4),
            method_buf: Vec::with_capacity(8),
            target_buf: Vec::with_capacity(256),
            version_buf: Vec::with_capacity(8),
            status_code_buf: Vec::with_capacity(3),
            header_name_buf: Vec::with_capacity(32),
            header_value_buf: Vec::with_capacity(128),
            chunk_size_buf: Vec::with_capacity(16),
            pending_method: None,
            pending_target: None,
            pending_version: None,
            pending_status_code: None,
            request_line: None,
            status_line: None,
            headers: HeaderMap::new(),
            header_count: 0,
            header_line_len: 0,
            body: Vec::new(),
            body_remaining: 0,
            chunk_remaining: 0,
            chunk_count: 0,
            keep_alive: true,
            transfer_encoding: TransferEncoding::Identity,
            content_length: None,
            bytes_since_last_message: 0,
            last_error: None,
        }
    }

    /// Fully reset the parser, including a terminal `Error` state, so it can
    /// be reused for a fresh connection.
    pub fn reset(&mut self) {
        self.phase = Phase::Sniff;
        self.kind = None;
        self.sniff.clear();
        self.reset_per_message();
        self.last_error = None;
    }

    fn reset_per_message(&mut self) {
        self.method_buf.clear();
        self.target_buf.clear();
        self.version_buf.clear();
        self.status_code_buf.clear();
        self.header_name_buf.clear();
        self.header_value_buf.clear();
        self.chunk_size_buf.clear();
        self.pending_method = None;
        self.pending_target = None;
        self.pending_version = None;
        self.pending_status_code = None;
        self.request_line = None;
        self.status_line = None;
        self.headers = HeaderMap::new();
        self.header_count = 0;
        self.header_line_len = 0;
        self.body = Vec::new();
        self.body_remaining = 0;
        self.chunk_remaining = 0;
        self.chunk_count = 0;
        self.keep_alive = true;
        self.transfer_encoding = TransferEncoding::Identity;
        self.content_length = None;
        self.bytes_since_last_message = 0;
    }

    /// Current coarse lifecycle state.
    pub fn state(&self) -> ParserState {
        if self.last_error.is_some() {
            ParserState::Error
        } else {
            self.phase.public_state()
        }
    }

    /// The error that moved this parser into `Error` state, if any.
    pub fn last_error(&self) -> Option<&ParserError> {
        self.last_error.as_ref()
    }

    /// Bytes consumed since the last completed message (or since creation /
    /// reset, if none has completed yet). Mirrors `getBufferedBytes`: bytes
    /// belonging to a not-yet-complete pipelined message.
    pub fn buffered_bytes(&self) -> usize {
        self.bytes_since_last_message
    }

    /// Feed a slice of bytes into the parser.
    ///
    /// Returns every message that became complete while consuming `data`,
    /// in arrival order — zero, one, or many (pipelining). If a byte in
    /// `data` is invalid, the parser transitions to [`ParserState::Error`]
    /// (inspect via [`Parser::state`] / [`Parser::last_error`]) and any
    /// messages completed before that byte are still returned.
    pub fn parse(&mut self, data: &[u8]) -> Vec<Message> {
        let mut messages = Vec::new();

        if self.last_error.is_some() {
            return messages;
        }

        let mut i = 0;
        while i < data.len() {
            match self.step(data, &mut i) {
                StepOutcome::Continue => continue,
                StepOutcome::NeedMoreData => break,
                StepOutcome::MessageComplete => {
                    if let Some(message) = self.take_message() {
                        messages.push(message);
                    }
                    self.phase = Phase::Sniff;
                    self.kind = None;
                    self.sniff.clear();
                    self.reset_per_message();
                }
                StepOutcome::Error(err) => {
                    self.last_error = Some(err);
                    break;
                }
            }
        }

        messages
    }

    /// Advance the state machine, stopping at a phase boundary so the caller
    /// can react (emit a message, bail on error, or keep looping).
    fn step(&mut self, data: &[u8], i: &mut usize) -> StepOutcome {
        match self.phase {
            Phase::Body => return self.bulk_copy_body(data, i),
            Phase::ChunkData => return self.bulk_copy_chunk(data, i),
            _ => {}
        }

        if *i >= data.len() {
            return StepOutcome::NeedMoreData;
        }

        let byte = data[*i];
        *i += 1;
        self.bytes_since_last_message += 1;

        match self.phase {
            Phase::Sniff => self.on_sniff(byte),
            Phase::ReqMethod => self.on_req_method(byte),
            Phase::ReqTarget => self.on_req_target(byte),
            Phase::ReqVersion => self.on_req_version(byte),
            Phase::ReqVersionLf => self.on_expect_lf(byte, Phase::HeaderStart, ParserErrorCode::InvalidVersion),
            Phase::RespVersion => self.on_resp_version(byte),
            Phase::RespStatus => self.on_resp_status(byte),
            Phase::RespReason => self.on_resp_reason(byte),
            Phase::RespReasonLf => self.on_expect_lf(byte, Phase::HeaderStart, ParserErrorCode::InvalidStatusCode),
            Phase::HeaderStart => self.on_header_start(byte),
            Phase::HeaderName => self.on_header_name(byte),
            Phase::HeaderValueOws => self.on_header_value_ows(byte),
            Phase::HeaderValue => self.on_header_value(byte),
            Phase::HeaderValueLf => self.on_expect_lf(byte, Phase::HeaderStart, ParserErrorCode::InvalidHeader),
            Phase::EndHeadersLf => self.on_end_headers_lf(byte),
            Phase::ChunkSize => self.on_chunk_size(byte),
            Phase::ChunkExt => self.on_chunk_ext(byte),
            Phase::ChunkSizeLf => self.on_chunk_size_lf(byte),
            Phase::ChunkDataCr => self.on_expect_byte(byte, b'\r', Phase::ChunkDataLf, ParserErrorCode::IncompleteChunk),
            Phase::ChunkDataLf => self.on_chunk_data_lf(byte),
            Phase::TrailerStart => self.on_trailer_start(byte),
            Phase::TrailerField => self.on_trailer_field(byte),
            Phase::TrailerFieldLf => self.on_trailer_lf(byte, Phase::TrailerStart),
            Phase::TrailerEndLf => self.on_trailer_lf(byte, Phase::Complete),
            Phase::Body | Phase::ChunkData | Phase::Complete => {
                unreachable!("handled by bulk-copy path or loop exit above")
            }
        }
    }

    // ----- bulk-copy body / chunk-data -------------------------------------

    fn bulk_copy_body(&mut self, data: &[u8], i: &mut usize) -> StepOutcome {
        let available = data.len() - *i;
        let to_copy = available.min(self.body_remaining);

        if self.body.len() + to_copy > self.config.max_body_size {
            return StepOutcome::Error(self.err(ParserErrorCode::BodyTooLarge, "body exceeds configured maximum"));
        }

        self.body.extend_from_slice(&data[*i..*i + to_copy]);
        self.body_remaining -= to_copy;
        self.bytes_since_last_message += to_copy;
        *i += to_copy;

        if self.body_remaining == 0 {
            self.phase = Phase::Complete;
            StepOutcome::MessageComplete
        } else {
            StepOutcome::NeedMoreData
        }
    }

    fn bulk_copy_chunk(&mut self, data: &[u8], i: &mut usize) -> StepOutcome {
        let available = data.len() - *i;
        let to_copy = available.min(self.chunk_remaining);

        if self.body.len() + to_copy > self.config.max_body_size {
            return StepOutcome::Error(self.err(ParserErrorCode::BodyTooLarge, "body exceeds configured maximum"));
        }

        self.body.extend_from_slice(&data[*i..*i + to_copy]);
        self.chunk_remaining -= to_copy;
        self.bytes_since_last_message += to_copy;
        *i += to_copy;

        if self.chunk_remaining == 0 {
            self.phase = Phase::ChunkDataCr;
        }
        StepOutcome::Continue
    }

    // ----- sniff -------------------------------------------------------

    fn on_sniff(&mut self, byte: u8) -> StepOutcome {
        const PREFIX: &[u8] = b"HTTP";
        let pos = self.sniff.len();
        if pos < PREFIX.len() && byte == PREFIX[pos] {
            self.sniff.push(byte);
            if self.sniff.len() == PREFIX.len() {
                self.kind = Some(Kind::Response);
                self.version_buf = std::mem::take(&mut self.sniff);
                self.phase = Phase::RespVersion;
            }
            StepOutcome::Continue
        } else {
            self.kind = Some(Kind::Request);
            self.method_buf = std::mem::take(&mut self.sniff);
            self.phase = Phase::ReqMethod;
            self.on_req_method(byte)
        }
    }

    // ----- request-line --------------------------------------------------

    fn on_req_method(&mut self, byte: u8) -> StepOutcome {
        if byte == b' ' {
            match Method::parse_with_max_len(&self.method_buf, self.config.max_method_len) {
                Ok(method) => {
                    self.pending_method = Some(method);
                    self.phase = Phase::ReqTarget;
                    StepOutcome::Continue
                }
                Err(code) => StepOutcome::Error(self.err(code, "invalid HTTP method")),
            }
        } else if validators::is_tchar(byte) {
            if self.method_buf.len() >= self.config.max_method_len {
                return StepOutcome::Error(self.err(ParserErrorCode::InvalidMethod, "method too long"));
            }
            self.method_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidMethod, "unexpected byte in method"))
        }
    }

    fn on_req_target(&mut self, byte: u8) -> StepOutcome {
        if byte == b' ' {
            let target = String::from_utf8_lossy(&self.target_buf).into_owned();
            if !validators::validate_target(&target, self.config.max_target_len) {
                return StepOutcome::Error(self.err(ParserErrorCode::InvalidTarget, "invalid request target"));
            }
            self.pending_target = Some(target);
            self.phase = Phase::ReqVersion;
            StepOutcome::Continue
        } else if byte > b' ' && byte != 0x7F {
            if self.target_buf.len() >= self.config.max_target_len {
                return StepOutcome::Error(self.err(ParserErrorCode::InvalidTarget, "target too long"));
            }
            self.target_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidTarget, "unexpected byte in target"))
        }
    }

    fn on_req_version(&mut self, byte: u8) -> StepOutcome {
        if byte == b'\r' {
            match Version::parse(&self.version_buf) {
                Ok(version) => {
                    self.request_line = Some(RequestLine {
                        method: self.pending_method.take().expect("method set before version"),
                        target: self.pending_target.take().expect("target set before version"),
                        version,
                    });
                    self.phase = Phase::ReqVersionLf;
                    StepOutcome::Continue
                }
                Err(code) => StepOutcome::Error(self.err(code, "invalid HTTP version")),
            }
        } else if byte >= b' ' && byte != 0x7F {
            if self.version_buf.len() >= 16 {
                return StepOutcome::Error(self.err(ParserErrorCode::InvalidVersion, "version too long"));
            }
            self.version_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidVersion, "unexpected byte in version"))
        }
    }

    // ----- status-line -----------------------------------------------------

    fn on_resp_version(&mut self, byte: u8) -> StepOutcome {
        if byte == b' ' {
            match Version::parse(&self.version_buf) {
                Ok(version) => {
                    self.pending_version = Some(version);
                    self.phase = Phase::RespStatus;
                    StepOutcome::Continue
                }
                Err(code) => StepOutcome::Error(self.err(code, "invalid HTTP version")),
            }
        } else if byte > b' ' && byte != 0x7F {
            if self.version_buf.len() >= 16 {
                return StepOutcome::Error(self.err(ParserErrorCode::InvalidVersion, "version too long"));
            }
            self.version_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidVersion, "unexpected byte in version"))
        }
    }

    fn on_resp_status(&mut self, byte: u8) -> StepOutcome {
        if byte == b' ' || byte == b'\r' {
            let code = match validators::validate_status_code_bytes(&self.status_code_buf) {
                Some(code) => code,
                None => {
                    return StepOutcome::Error(self.err(
                        ParserErrorCode::InvalidStatusCode,
                        "status code must be exactly three digits in [100, 999]",
                    ))
                }
            };
            self.pending_status_code = Some(code);
            self.status_code_buf.clear();
            if byte == b' ' {
                self.phase = Phase::RespReason;
                StepOutcome::Continue
            } else {
                self.finish_status_line(String::new());
                self.phase = Phase::RespReasonLf;
                StepOutcome::Continue
            }
        } else if byte.is_ascii_digit() {
            if self.status_code_buf.len() >= 3 {
                return StepOutcome::Error(self.err(ParserErrorCode::InvalidStatusCode, "status code too long"));
            }
            self.status_code_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidStatusCode, "unexpected byte in status code"))
        }
    }

    fn on_resp_reason(&mut self, byte: u8) -> StepOutcome {
        if byte == b'\r' {
            let reason = String::from_utf8_lossy(&self.header_value_buf).into_owned();
            self.header_value_buf.clear();
            self.finish_status_line(reason);
            self.phase = Phase::RespReasonLf;
            StepOutcome::Continue
        } else if validators::is_header_value_byte(byte) {
            self.header_value_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidStatusCode, "unexpected byte in reason phrase"))
        }
    }

    fn finish_status_line(&mut self, reason: String) {
        self.status_line = Some(StatusLine {
            version: self.pending_version.take().expect("version set before reason"),
            status_code: self.pending_status_code.take().expect("status set before reason"),
            reason,
        });
    }

    // ----- headers -----------------------------------------------------

    fn on_header_start(&mut self, byte: u8) -> StepOutcome {
        if byte == b'\r' {
            self.phase = Phase::EndHeadersLf;
            StepOutcome::Continue
        } else if validators::is_tchar(byte) {
            if self.header_count >= self.config.max_headers {
                return StepOutcome::Error(self.err(ParserErrorCode::TooManyHeaders, "too many headers"));
            }
            self.header_name_buf.clear();
            self.header_name_buf.push(byte);
            self.header_line_len = 0;
            self.phase = Phase::HeaderName;
            match self.bump_line_len() {
                Ok(()) => StepOutcome::Continue,
                Err(err) => StepOutcome::Error(err),
            }
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidHeader, "unexpected byte starting header line"))
        }
    }

    fn on_header_name(&mut self, byte: u8) -> StepOutcome {
        if byte == b':' {
            if let Err(err) = self.bump_line_len() {
                return StepOutcome::Error(err);
            }
            self.header_value_buf.clear();
            self.phase = Phase::HeaderValueOws;
            StepOutcome::Continue
        } else if validators::is_tchar(byte) {
            if self.header_name_buf.len() >= self.config.max_header_name_len {
                return StepOutcome::Error(self.err(ParserErrorCode::HeaderNameTooLong, "header name too long"));
            }
            self.header_name_buf.push(byte);
            match self.bump_line_len() {
                Ok(()) => StepOutcome::Continue,
                Err(err) => StepOutcome::Error(err),
            }
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidHeader, "unexpected byte in header name"))
        }
    }

    fn on_header_value_ows(&mut self, byte: u8) -> StepOutcome {
        if byte == b' ' || byte == b'\t' {
            match self.bump_line_len() {
                Ok(()) => StepOutcome::Continue,
                Err(err) => StepOutcome::Error(err),
            }
        } else if byte == b'\r' {
            match self.store_current_header() {
                Ok(()) => {
                    self.phase = Phase::HeaderValueLf;
                    StepOutcome::Continue
                }
                Err(err) => StepOutcome::Error(err),
            }
        } else if validators::is_header_value_byte(byte) {
            if let Err(err) = self.bump_line_len() {
                return StepOutcome::Error(err);
            }
            self.header_value_buf.push(byte);
            self.phase = Phase::HeaderValue;
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidHeader, "unexpected byte in header value"))
        }
    }

    fn on_header_value(&mut self, byte: u8) -> StepOutcome {
        if byte == b'\r' {
            while self
                .header_value_buf
                .last()
                .is_some_and(|&b| b == b' ' || b == b'\t')
            {
                self.header_value_buf.pop();
            }
            match self.store_current_header() {
                Ok(()) => {
                    self.phase = Phase::HeaderValueLf;
                    StepOutcome::Continue
                }
                Err(err) => StepOutcome::Error(err),
            }
        } else if validators::is_header_value_byte(byte) {
            if self.header_value_buf.len() >= self.config.max_header_value_len {
                return StepOutcome::Error(self.err(ParserErrorCode::HeaderValueTooLong, "header value too long"));
            }
            if let Err(err) = self.bump_line_len() {
                return StepOutcome::Error(err);
            }
            self.header_value_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidHeader, "unexpected byte in header value"))
        }
    }

    /// Count one more byte toward the current header line (name, colon, OWS,
    /// or value — not the terminating CRLF) and enforce `max_header_line_length`.
    fn bump_line_len(&mut self) -> Result<(), ParserError> {
        self.header_line_len += 1;
        if self.header_line_len > self.config.max_header_line_length {
            return Err(self.err(ParserErrorCode::HeaderValueTooLong, "header line exceeds configured maximum length"));
        }
        Ok(())
    }

    fn store_current_header(&mut self) -> Result<(), ParserError> {
        if self.config.validate_header_names
            && !validators::validate_header_name(
                &self.header_name_buf,
                self.config.max_header_name_len,
                self.config.allow_underscore_in_headers,
            )
        {
            return Err(self.err(ParserErrorCode::InvalidHeader, "invalid header name"));
        }
        if self.config.validate_header_values
            && !validators::validate_header_value(&self.header_value_buf, self.config.max_header_value_len)
        {
            return Err(self.err(ParserErrorCode::InvalidHeader, "invalid header value"));
        }

        let name = String::from_utf8_lossy(&self.header_name_buf).into_owned();
        let value = String::from_utf8_lossy(&self.header_value_buf).into_owned();
        self.headers.append(name, value);
        self.header_count += 1;
        Ok(())
    }

    fn on_end_headers_lf(&mut self, byte: u8) -> StepOutcome {
        if byte != b'\n' {
            return StepOutcome::Error(self.err(ParserErrorCode::InvalidHeader, "expected LF after end-of-headers CR"));
        }
        debug!(
            "headers complete: {} header(s), kind={:?}",
            self.header_count, self.kind
        );
        match self.determine_body_handling() {
            Ok(()) => {
                if self.phase == Phase::Complete {
                    StepOutcome::MessageComplete
                } else {
                    StepOutcome::Continue
                }
            }
            Err(err) => StepOutcome::Error(err),
        }
    }

    /// Inspect parsed headers to decide body framing (§4.5): `Connection:
    /// close` forces `keep_alive` false, HTTP/1.0 defaults `keep_alive` to
    /// false absent an explicit `Connection: keep-alive`, and a chunked
    /// `Transfer-Encoding` always wins over `Content-Length`.
    fn determine_body_handling(&mut self) -> Result<(), ParserError> {
        if self.headers.value_contains_ci("connection", "close") {
            self.keep_alive = false;
        }

        let version = self
            .request_line
            .as_ref()
            .map(|r| r.version)
            .or_else(|| self.status_line.as_ref().map(|s| s.version))
            .unwrap_or(Version::Http11);
        if version == Version::Http10 && !self.headers.value_contains_ci("connection", "keep-alive") {
            self.keep_alive = false;
        }

        if self.headers.value_contains_ci("transfer-encoding", "chunked") {
            self.transfer_encoding = TransferEncoding::Chunked;
            self.chunk_size_buf.clear();
            self.phase = Phase::ChunkSize;
            return Ok(());
        }

        let cl_values = self.headers.get_all("content-length");
        if cl_values.len() > 1 {
            let first = cl_values[0].trim();
            if !cl_values.iter().all(|v| v.trim() == first) {
                return Err(self.err(
                    ParserErrorCode::InvalidContentLength,
                    "multiple differing Content-Length values",
                ));
            }
        }

        if let Some(cl_str) = cl_values.first() {
            let length = validators::parse_content_length(cl_str)
                .ok_or_else(|| self.err(ParserErrorCode::InvalidContentLength, "malformed Content-Length"))?;

            if length > self.config.max_body_size {
                return Err(self.err(ParserErrorCode::BodyTooLarge, "Content-Length exceeds configured maximum"));
            }

            self.transfer_encoding = TransferEncoding::ContentLength;
            self.content_length = Some(length);

            if length == 0 {
                self.phase = Phase::Complete;
            } else {
                self.body_remaining = length;
                self.body.reserve(length.min(65_536));
                self.phase = Phase::Body;
            }
        } else {
            self.phase = Phase::Complete;
        }

        Ok(())
    }

    // ----- chunked transfer encoding ----------------------------------

    fn on_chunk_size(&mut self, byte: u8) -> StepOutcome {
        if byte == b'\r' {
            match self.apply_chunk_size() {
                Ok(()) => {
                    self.phase = Phase::ChunkSizeLf;
                    StepOutcome::Continue
                }
                Err(err) => StepOutcome::Error(err),
            }
        } else if byte == b';' {
            match self.apply_chunk_size() {
                Ok(()) => {
                    self.phase = Phase::ChunkExt;
                    StepOutcome::Continue
                }
                Err(err) => StepOutcome::Error(err),
            }
        } else if byte.is_ascii_hexdigit() {
            self.chunk_size_buf.push(byte);
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(ParserErrorCode::InvalidChunkSize, "non-hex byte in chunk size"))
        }
    }

    fn on_chunk_ext(&mut self, byte: u8) -> StepOutcome {
        // RFC 9112 §7.1.1: chunk extensions are ignored.
        if byte == b'\r' {
            self.phase = Phase::ChunkSizeLf;
        }
        StepOutcome::Continue
    }

    fn on_chunk_size_lf(&mut self, byte: u8) -> StepOutcome {
        if byte != b'\n' {
            return StepOutcome::Error(self.err(ParserErrorCode::InvalidChunkSize, "expected LF after chunk-size CR"));
        }
        if self.chunk_remaining == 0 {
            self.phase = Phase::TrailerStart;
        } else {
            self.chunk_count += 1;
            if self.chunk_count > self.config.max_chunks {
                return StepOutcome::Error(self.err(
                    ParserErrorCode::InvalidChunkSize,
                    "chunk count exceeds configured maximum",
                ));
            }
            self.phase = Phase::ChunkData;
        }
        StepOutcome::Continue
    }

    fn apply_chunk_size(&mut self) -> Result<(), ParserError> {
        if self.chunk_size_buf.is_empty() {
            return Err(self.err(ParserErrorCode::InvalidChunkSize, "empty chunk size"));
        }
        let size_str = String::from_utf8_lossy(&self.chunk_size_buf).into_owned();
        let size = validators::parse_chunk_size(&size_str, self.config.max_body_size)
            .ok_or_else(|| self.err(ParserErrorCode::InvalidChunkSize, "malformed or oversized chunk size"))?;

        if self.body.len() + size > self.config.max_body_size {
            return Err(self.err(ParserErrorCode::BodyTooLarge, "chunked body exceeds configured maximum"));
        }

        self.chunk_remaining = size;
        self.chunk_size_buf.clear();
        Ok(())
    }

    fn on_chunk_data_lf(&mut self, byte: u8) -> StepOutcome {
        if byte != b'\n' {
            return StepOutcome::Error(self.err(ParserErrorCode::IncompleteChunk, "expected LF after chunk data CR"));
        }
        self.chunk_size_buf.clear();
        self.phase = Phase::ChunkSize;
        StepOutcome::Continue
    }

    // ----- trailers -----------------------------------------------------

    fn on_trailer_start(&mut self, byte: u8) -> StepOutcome {
        if byte == b'\r' {
            self.phase = Phase::TrailerEndLf;
        } else {
            // Trailer fields are consumed and discarded — trailer surfacing
            // is out of scope.
            self.phase = Phase::TrailerField;
        }
        StepOutcome::Continue
    }

    fn on_trailer_field(&mut self, byte: u8) -> StepOutcome {
        if byte == b'\r' {
            self.phase = Phase::TrailerFieldLf;
        }
        StepOutcome::Continue
    }

    fn on_trailer_lf(&mut self, byte: u8, next: Phase) -> StepOutcome {
        if byte != b'\n' {
            return StepOutcome::Error(self.err(ParserErrorCode::InvalidChunkTrailer, "expected LF in trailer section"));
        }
        if next == Phase::Complete {
            self.phase = Phase::Complete;
            StepOutcome::MessageComplete
        } else {
            self.phase = next;
            StepOutcome::Continue
        }
    }

    // ----- shared small-state helpers -------------------------------------

    fn on_expect_lf(&mut self, byte: u8, next: Phase, code: ParserErrorCode) -> StepOutcome {
        if byte == b'\n' {
            self.phase = next;
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(code, "expected LF after CR"))
        }
    }

    fn on_expect_byte(&mut self, byte: u8, expected: u8, next: Phase, code: ParserErrorCode) -> StepOutcome {
        if byte == expected {
            self.phase = next;
            StepOutcome::Continue
        } else {
            StepOutcome::Error(self.err(code, "malformed chunk framing"))
        }
    }

    fn err(&self, code: ParserErrorCode, message: &str) -> ParserError {
        warn!("parse failure: {code} ({message}) in state {:?}", self.phase.public_state());
        ParserError::new(code, message.to_string(), self.phase.public_state())
            .with_position(self.bytes_since_last_message)
    }

    fn take_message(&mut self) -> Option<Message> {
        let headers = std::mem::take(&mut self.headers);
        let body = std::mem::take(&mut self.body);
        match self.kind {
            Some(Kind::Request) => self.request_line.take().map(|line| Message::Request {
                line,
                headers,
                body,
                keep_alive: self.keep_alive,
                transfer_encoding: self.transfer_encoding,
                content_length: self.content_length,
            }),
            Some(Kind::Response) => self.status_line.take().map(|line| Message::Response {
                line,
                headers,
                body,
                keep_alive: self.keep_alive,
                transfer_encoding: self.transfer_encoding,
                content_length: self.content_length,
            }),
            None => None,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_dispatches_request_vs_response() {
        let mut p = Parser::new();
        let messages = p.parse(b"GET / HTTP/1.1\r\nHost: h\r\n\r\n");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_request());

        let mut p = Parser::new();
        let messages = p.parse(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_response());
    }

    #[test]
    fn pipelined_requests_emit_in_one_call() {
        let mut p = Parser::new();
        let raw = b"GET /1 HTTP/1.1\r\nHost: h\r\n\r\nGET /2 HTTP/1.1\r\nHost: h\r\n\r\nGET /3 HTTP/1.1\r\nHost: h\r\n\r\n";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn empty_input_yields_no_messages_and_no_error() {
        let mut p = Parser::new();
        assert!(p.parse(b"").is_empty());
        assert_eq!(p.state(), ParserState::Idle);
    }

    #[test]
    fn byte_by_byte_feed_reassembles_one_message() {
        let mut p = Parser::new();
        let raw = b"GET / HTTP/1.1\r\nHost: h\r\n\r\n";
        let mut messages = Vec::new();
        for &b in raw {
            messages.extend(p.parse(&[b]));
        }
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].headers().get("host"), Some("h".to_string()));
    }

    #[test]
    fn buffered_bytes_reports_pending_next_message() {
        let mut p = Parser::new();
        let raw = b"GET / HTTP/1.1\r\nHost: h\r\n\r\nGET";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(p.buffered_bytes(), 3);
    }

    #[test]
    fn content_length_body_is_captured() {
        let mut p = Parser::new();
        let raw = b"POST /x HTTP/1.1\r\nHost: h\r\nContent-Length: 5\r\n\r\nhello";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body(), b"hello");
    }

    #[test]
    fn chunked_body_is_decoded_and_trailers_discarded() {
        let mut p = Parser::new();
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\nX-Trailer: ignored\r\n\r\n";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body(), b"Wikipedia");
    }

    #[test]
    fn http10_without_keep_alive_header_defaults_connection_close() {
        let mut p = Parser::new();
        let raw = b"GET / HTTP/1.0\r\nHost: h\r\n\r\n";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].keep_alive());
    }

    #[test]
    fn connection_close_header_overrides_keep_alive() {
        let mut p = Parser::new();
        let raw = b"GET / HTTP/1.1\r\nHost: h\r\nConnection: close\r\n\r\n";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].keep_alive());
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let mut p = Parser::new();
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 999\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nhi\r\n0\r\n\r\n";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body(), b"hi");
        assert_eq!(messages[0].transfer_encoding(), TransferEncoding::Chunked);
    }

    #[test]
    fn error_state_is_terminal_until_reset() {
        let mut p = Parser::new();
        let messages = p.parse(b"BAD METHOD HERE / HTTP/1.1\r\n\r\n");
        assert!(messages.is_empty());
        assert_eq!(p.state(), ParserState::Error);
        assert!(p.last_error().is_some());
        assert!(p.parse(b"more data").is_empty());
        p.reset();
        assert_eq!(p.state(), ParserState::Idle);
    }

    #[test]
    fn body_too_large_is_rejected() {
        let config = ParserConfig {
            max_body_size: 4,
            ..ParserConfig::default()
        };
        let mut p = Parser::with_config(config);
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\n0123456789";
        let messages = p.parse(raw);
        assert!(messages.is_empty());
        assert_eq!(p.last_error().unwrap().code, ParserErrorCode::BodyTooLarge);
    }

    #[test]
    fn too_many_headers_is_rejected() {
        let config = ParserConfig {
            max_headers: 1,
            ..ParserConfig::default()
        };
        let mut p = Parser::with_config(config);
        let raw = b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\n\r\n";
        let messages = p.parse(raw);
        assert!(messages.is_empty());
        assert_eq!(p.last_error().unwrap().code, ParserErrorCode::TooManyHeaders);
    }

    #[test]
    fn combined_header_line_length_cap_is_enforced_even_under_individual_caps() {
        // 50-byte name + 60-byte value, each under generous individual caps,
        // but their combined line (112 bytes) exceeds max_header_line_length.
        let config = ParserConfig {
            max_header_name_len: 200,
            max_header_value_len: 200,
            max_header_line_length: 100,
            ..ParserConfig::default()
        };
        let mut p = Parser::with_config(config);
        let name = "X".repeat(50);
        let value = "Y".repeat(60);
        let raw = format!("GET / HTTP/1.1\r\n{name}: {value}\r\n\r\n");
        let messages = p.parse(raw.as_bytes());
        assert!(messages.is_empty());
        assert_eq!(p.last_error().unwrap().code, ParserErrorCode::HeaderValueTooLong);
    }

    #[test]
    fn header_line_within_combined_cap_is_accepted() {
        let config = ParserConfig {
            max_header_line_length: 100,
            ..ParserConfig::default()
        };
        let mut p = Parser::with_config(config);
        let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let messages = p.parse(raw);
        assert_eq!(messages.len(), 1);
    }
}
