use serde::{Serialize, Serializer};

use crate::error::{ParserErrorCode, ParserState};
use crate::validators;
use crate::ParserError;

// ---------------------------------------------------------------------------
// HeaderMap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
struct HeaderEntry {
    name: String,
    value: String,
}

/// An ordered, case-insensitive, multi-valued header container.
///
/// Entries are stored in a flat vector in wire order; a side index maps
/// each lowercase name to the indices of the entries carrying it. `delete`
/// and `set` drop the index's entry rather than shifting the vector, so
/// existing indices never need renumbering — the vector is the source of
/// truth, the index is a view over it (see DESIGN.md for why this replaces
/// the synthetic-key approach some reference implementations use).
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<HeaderEntry>,
    active: Vec<bool>,
    index: std::collections::HashMap<String, Vec<usize>>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new entry without touching any existing entry sharing the name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let lower = name.to_ascii_lowercase();
        let idx = self.entries.len();
        self.entries.push(HeaderEntry {
            name,
            value: value.into(),
        });
        self.active.push(true);
        self.index.entry(lower).or_default().push(idx);
    }

    /// Replace every entry sharing `name`'s lowercase form with one new entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.delete(&name);
        self.append(name, value);
    }

    /// Remove every entry sharing `name`'s lowercase form.
    /// Returns whether anything was removed.
    pub fn delete(&mut self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        match self.index.remove(&lower) {
            Some(idxs) => {
                for idx in idxs {
                    self.active[idx] = false;
                }
                true
            }
            None => false,
        }
    }

    /// The comma-joined values of all entries with this name (insertion
    /// order), or `None` if the name is absent.
    pub fn get(&self, name: &str) -> Option<String> {
        let values = self.get_all(name);
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// The per-entry values for this name, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        let lower = name.to_ascii_lowercase();
        match self.index.get(&lower) {
            Some(idxs) => idxs
                .iter()
                .filter(|&&i| self.active[i])
                .map(|&i| self.entries[i].value.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// `true` if a case-insensitive header value contains `needle`
    /// (case-insensitive substring match), e.g. for `Transfer-Encoding`.
    pub fn value_contains_ci(&self, name: &str, needle: &str) -> bool {
        self.get(name)
            .map(|v| v.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    /// Distinct original-case names, in insertion order of first occurrence.
    pub fn names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if !self.active[i] {
                continue;
            }
            let lower = entry.name.to_ascii_lowercase();
            if seen.insert(lower) {
                out.push(entry.name.as_str());
            }
        }
        out
    }

    /// Mapping from lowercase name to comma-joined values.
    pub fn to_object(&self) -> std::collections::HashMap<String, String> {
        let mut out = std::collections::HashMap::new();
        for name in self.names() {
            if let Some(value) = self.get(name) {
                out.insert(name.to_ascii_lowercase(), value);
            }
        }
        out
    }

    /// Iterate live entries in wire order as `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .zip(self.active.iter())
            .filter(|(_, active)| **active)
            .map(|(entry, _)| (entry.name.as_str(), entry.value.as_str()))
    }

    /// Number of distinct lowercase names.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Total live entry count, including duplicates under one name.
    pub fn total_entries(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// Serialize every live entry as `Name: Value\r\n`, terminated by the
    /// block-ending empty line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_entries() * 32 + 2);
        for (name, value) in self.iter() {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}

impl PartialEq for HeaderMap {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}
impl Eq for HeaderMap {}

/// Serializes as a JSON array of `{"name": ..., "value": ...}` objects in
/// wire order, preserving duplicates — a JSON object would collapse
/// repeated header names such as `Set-Cookie`.
impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.total_entries()))?;
        for (name, value) in self.iter() {
            seq.serialize_element(&HeaderEntry {
                name: name.to_string(),
                value: value.to_string(),
            })?;
        }
        seq.end()
    }
}

// ---------------------------------------------------------------------------
// Header-line / header-block parsing (§4.4)
// ---------------------------------------------------------------------------

/// Split one header line (without its trailing CRLF) into a trimmed
/// `(name, value)` pair.
///
/// Fails if there is no `:`, the name is empty after trimming, or the
/// value is empty after trimming — this crate deliberately rejects empty
/// values and obsolete line-folding, see DESIGN.md.
pub fn split_header_line(line: &[u8]) -> Result<(&[u8], &[u8]), ParserErrorCode> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParserErrorCode::InvalidHeader)?;
    let (name, rest) = line.split_at(colon);
    let value = &rest[1..];

    let name = trim_ows(name);
    let value = trim_ows(value);

    if name.is_empty() || value.is_empty() {
        return Err(ParserErrorCode::InvalidHeader);
    }
    Ok((name, value))
}

fn trim_ows(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != b'\t')
        .map(|i| i + 1)
        .unwrap_or(0);
    if start >= end {
        &[]
    } else {
        &bytes[start..end]
    }
}

/// Configuration needed by the standalone header-block parser. A subset of
/// [`crate::ParserConfig`], kept separate so this module has no dependency
/// on the streaming parser.
#[derive(Debug, Clone, Copy)]
pub struct HeaderBlockLimits {
    pub max_headers: usize,
    pub max_header_line_length: usize,
    pub max_header_name_len: usize,
    pub max_header_value_len: usize,
    pub validate_names: bool,
    pub validate_values: bool,
    pub allow_underscore: bool,
}

impl Default for HeaderBlockLimits {
    fn default() -> Self {
        Self {
            max_headers: 256,
            max_header_line_length: 8192,
            max_header_name_len: 256,
            max_header_value_len: 8192,
            validate_names: true,
            validate_values: true,
            allow_underscore: true,
        }
    }
}

/// Parse a full header block: the byte range after the start-line up to and
/// including the terminating empty line. Returns the populated map and the
/// number of bytes consumed (including the terminating CRLF).
///
/// This is the buffer-oriented counterpart of the streaming parser's
/// inlined, byte-at-a-time header scanner — see DESIGN.md for why both
/// exist. It backs the crate's header-block round-trip tests and
/// `parse_headers`.
pub fn parse_header_block(
    data: &[u8],
    limits: &HeaderBlockLimits,
) -> Result<(HeaderMap, usize), ParserError> {
    let mut headers = HeaderMap::new();
    let mut pos = 0usize;
    let mut count = 0usize;

    loop {
        let line_end = data[pos..]
            .windows(2)
            .position(|w| w == b"\r\n")
            .map(|i| pos + i);
        let Some(line_end) = line_end else {
            return Err(ParserError::new(
                ParserErrorCode::InvalidHeader,
                "header block missing terminating CRLF",
                ParserState::Headers,
            )
            .with_position(pos));
        };

        let line = &data[pos..line_end];
        if line.len() > limits.max_header_line_length {
            return Err(ParserError::new(
                ParserErrorCode::HeaderValueTooLong,
                "header line exceeds configured maximum length",
                ParserState::Headers,
            )
            .with_position(pos));
        }

        if line.is_empty() {
            return Ok((headers, line_end + 2));
        }

        if count >= limits.max_headers {
            return Err(ParserError::new(
                ParserErrorCode::TooManyHeaders,
                "header count exceeds configured maximum",
                ParserState::Headers,
            )
            .with_position(pos));
        }

        let (name, value) = split_header_line(line).map_err(|code| {
            ParserError::new(code, "malformed header line", ParserState::Headers).with_position(pos)
        })?;

        if limits.validate_names
            && !validators::validate_header_name(name, limits.max_header_name_len, limits.allow_underscore)
        {
            return Err(ParserError::new(
                ParserErrorCode::HeaderNameTooLong,
                "invalid or oversized header name",
                ParserState::Headers,
            )
            .with_position(pos));
        }
        if limits.validate_values && !validators::validate_header_value(value, limits.max_header_value_len)
        {
            return Err(ParserError::new(
                ParserErrorCode::HeaderValueTooLong,
                "invalid or oversized header value",
                ParserState::Headers,
            )
            .with_position(pos));
        }

        headers.append(
            String::from_utf8_lossy(name).into_owned(),
            String::from_utf8_lossy(value).into_owned(),
        );
        count += 1;
        pos = line_end + 2;
    }
}

/// Parse a standalone header block (no start-line, no body) using default
/// limits. Primarily useful for the `toBytes` / `parse_headers` round-trip
/// property: `parse_headers(map.to_bytes())? == map`.
pub fn parse_headers(data: &[u8]) -> Result<HeaderMap, ParserError> {
    parse_header_block(data, &HeaderBlockLimits::default()).map(|(map, _)| map)
}
