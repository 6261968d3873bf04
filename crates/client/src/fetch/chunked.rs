//! `Transfer-Encoding: chunked` reassembly.

use std::io::{self, BufRead};

use bytes::BytesMut;
use wisp_core::Error;

use super::response::read_line;

/// Reassemble a chunked body into the original byte stream.
///
/// Reads `<hex-size>[;ext]\r\n<bytes>\r\n` segments until the zero-size
/// segment, then discards any trailer lines. A size token that is not hex,
/// a chunk shorter than announced, or a chunk not followed by CRLF fails with
/// `Error::ProtocolFraming`.
pub fn read_chunked<R: BufRead>(reader: &mut R, max_bytes: usize) -> Result<BytesMut, Error> {
    let mut body = BytesMut::new();

    loop {
        let line = read_line(reader)?
            .ok_or_else(|| Error::ProtocolFraming("stream ended before chunk size".into()))?;
        let size = parse_chunk_size(&line)?;
        if size == 0 {
            break;
        }

        if size > max_bytes.saturating_sub(body.len()) {
            return Err(Error::FetchTooLarge(format!("chunked body exceeds {max_bytes} bytes")));
        }

        let start = body.len();
        body.resize(start + size, 0);
        reader
            .read_exact(&mut body[start..])
            .map_err(|e| truncated(e, &format!("chunk shorter than announced {size} bytes")))?;

        let mut terminator = [0u8; 2];
        reader
            .read_exact(&mut terminator)
            .map_err(|e| truncated(e, "chunk missing trailing CRLF"))?;
        if &terminator != b"\r\n" {
            return Err(Error::ProtocolFraming("chunk not terminated by CRLF".into()));
        }
    }

    // trailers
    while let Some(line) = read_line(reader)? {
        if line.is_empty() {
            break;
        }
    }

    tracing::debug!(bytes = body.len(), "reassembled chunked body");
    Ok(body)
}

/// Parse the hexadecimal size at the start of a chunk-size line.
pub fn parse_chunk_size(line: &str) -> Result<usize, Error> {
    let token = line.split(';').next().unwrap_or_default().trim();
    if token.is_empty() {
        return Err(Error::ProtocolFraming("empty chunk size".into()));
    }
    if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::ProtocolFraming(format!("invalid chunk size: {token:?}")));
    }
    usize::from_str_radix(token, 16).map_err(|_| Error::ProtocolFraming(format!("invalid chunk size: {token:?}")))
}

fn truncated(err: io::Error, what: &str) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::ProtocolFraming(what.to_string())
    } else {
        Error::Io(err)
    }
}
