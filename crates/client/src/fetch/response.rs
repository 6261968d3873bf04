//! HTTP/1.x response framing: status line, header block, and body.

use std::collections::HashMap;
use std::io::{self, BufRead, Read};

use bytes::BytesMut;
use wisp_core::Error;

use super::chunked::read_chunked;

/// Parsed `HTTP/x.y <code> <reason>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    pub fn parse(line: &str) -> Result<Self, Error> {
        let mut parts = line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        let code = parts.next().unwrap_or_default();
        let reason = parts.next().unwrap_or_default();

        if !version.starts_with("HTTP/") {
            return Err(Error::ProtocolFraming(format!("malformed status line: {line:?}")));
        }
        let code = code
            .parse::<u16>()
            .ok()
            .filter(|c| (100..1000).contains(c))
            .ok_or_else(|| Error::ProtocolFraming(format!("malformed status code in {line:?}")))?;

        Ok(Self { version: version.to_string(), code, reason: reason.trim().to_string() })
    }
}

/// Response headers keyed by lower-cased name, values trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: HashMap<String, String>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header; a repeated name keeps the last value.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.entries.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `charset=` parameter of `content-type`, if any.
    pub fn charset(&self) -> Option<&str> {
        self.get("content-type")?
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"'))
            .filter(|value| !value.is_empty())
    }

    /// The `transfer-encoding` codings in order, lower-cased.
    pub fn transfer_codings(&self) -> Vec<String> {
        self.get("transfer-encoding")
            .map(|te| {
                te.split(',')
                    .map(|coding| coding.trim().to_ascii_lowercase())
                    .filter(|coding| !coding.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the body uses chunked transfer framing.
    pub fn is_chunked(&self) -> bool {
        self.transfer_codings().iter().any(|coding| coding == "chunked")
    }

    /// The declared `content-length`, if any.
    pub fn content_length(&self) -> Result<Option<usize>, Error> {
        self.get("content-length")
            .map(|raw| {
                raw.parse::<usize>()
                    .map_err(|_| Error::ProtocolFraming(format!("invalid content-length: {raw:?}")))
            })
            .transpose()
    }
}

impl FromIterator<(String, String)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(&name, &value);
        }
        headers
    }
}

/// Longest status, header, chunk-size or trailer line accepted, terminator excluded.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Most header lines accepted in one header block.
pub const MAX_HEADER_LINES: usize = 128;

/// Read one line, without its `\r\n` or `\n` terminator.
///
/// Returns `None` at end of stream. A TLS peer that closes without
/// close_notify is treated as end of stream. A line longer than
/// [`MAX_LINE_BYTES`] fails with `Error::ProtocolFraming`.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, Error> {
    let mut buf = Vec::new();
    let limit = (MAX_LINE_BYTES + 2) as u64;
    match (&mut *reader).take(limit).read_until(b'\n', &mut buf) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
        Err(e) => return Err(Error::Io(e)),
    }
    if buf.is_empty() {
        return Ok(None);
    }

    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    if buf.len() > MAX_LINE_BYTES {
        return Err(Error::ProtocolFraming(format!("line exceeds {MAX_LINE_BYTES} bytes")));
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| Error::ProtocolFraming("line is not valid UTF-8".into()))
}

/// Read and parse the status line.
pub fn read_status_line<R: BufRead>(reader: &mut R) -> Result<StatusLine, Error> {
    let line = read_line(reader)?
        .ok_or_else(|| Error::ProtocolFraming("connection closed before status line".into()))?;
    StatusLine::parse(&line)
}

/// Read header lines up to and including the blank line that ends the block.
pub fn read_headers<R: BufRead>(reader: &mut R) -> Result<ResponseHeaders, Error> {
    let mut headers = ResponseHeaders::new();
    for _ in 0..=MAX_HEADER_LINES {
        let line = read_line(reader)?
            .ok_or_else(|| Error::ProtocolFraming("connection closed inside header block".into()))?;
        if line.is_empty() {
            return Ok(headers);
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::ProtocolFraming(format!("malformed header line: {line:?}")))?;
        headers.insert(name, value);
    }
    Err(Error::ProtocolFraming(format!("more than {MAX_HEADER_LINES} header lines")))
}

/// Read the body according to the framing the headers announce.
///
/// Precedence: chunked transfer-encoding, then `content-length`, then
/// everything up to end of stream. Transfer codings other than `chunked`
/// and `identity` fail with `Error::UnsupportedEncoding`.
pub fn read_body<R: BufRead>(reader: &mut R, headers: &ResponseHeaders, max_bytes: usize) -> Result<BytesMut, Error> {
    if let Some(other) = headers
        .transfer_codings()
        .into_iter()
        .find(|coding| coding != "chunked" && coding != "identity")
    {
        return Err(Error::UnsupportedEncoding(format!("transfer-encoding {other}")));
    }

    if headers.is_chunked() {
        return read_chunked(reader, max_bytes);
    }

    if let Some(length) = headers.content_length()? {
        if length > max_bytes {
            return Err(Error::FetchTooLarge(format!("{length} bytes exceeds {max_bytes}")));
        }
        let mut body = BytesMut::zeroed(length);
        reader.read_exact(&mut body).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::ProtocolFraming(format!("body shorter than content-length {length}"))
            } else {
                Error::Io(e)
            }
        })?;
        return Ok(body);
    }

    read_to_end(reader, max_bytes)
}

fn read_to_end<R: Read>(reader: &mut R, max_bytes: usize) -> Result<BytesMut, Error> {
    let mut body = BytesMut::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::Io(e)),
        };
        if n > max_bytes.saturating_sub(body.len()) {
            return Err(Error::FetchTooLarge(format!("body exceeds {max_bytes} bytes")));
        }
        body.extend_from_slice(&buf[..n]);
    }
    Ok(body)
}
