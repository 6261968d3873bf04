//! Payload decoding: content-coding, then charset.

use std::io::Read;

use encoding_rs::{Encoding, UTF_8};
use flate2::read::GzDecoder;
use wisp_core::Error;

use super::response::ResponseHeaders;

/// Content codings the fetcher can undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Identity,
    Gzip,
}

impl ContentCoding {
    /// Determine the coding from `content-encoding`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedEncoding` for anything but `gzip` and `identity`.
    pub fn from_headers(headers: &ResponseHeaders) -> Result<Self, Error> {
        match headers.get("content-encoding").map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("identity") => Ok(ContentCoding::Identity),
            Some("gzip") | Some("x-gzip") => Ok(ContentCoding::Gzip),
            Some(other) => Err(Error::UnsupportedEncoding(other.to_string())),
        }
    }

    /// Undo the coding, refusing output larger than `max_bytes`.
    pub fn decode(self, bytes: &[u8], max_bytes: usize) -> Result<Vec<u8>, Error> {
        match self {
            ContentCoding::Identity => Ok(bytes.to_vec()),
            ContentCoding::Gzip => {
                let mut out = Vec::new();
                GzDecoder::new(bytes)
                    .take(max_bytes as u64 + 1)
                    .read_to_end(&mut out)
                    .map_err(|e| Error::ProtocolFraming(format!("invalid gzip payload: {e}")))?;
                if out.len() > max_bytes {
                    return Err(Error::FetchTooLarge(format!("decompressed body exceeds {max_bytes} bytes")));
                }
                tracing::debug!(compressed = bytes.len(), decompressed = out.len(), "gunzipped body");
                Ok(out)
            }
        }
    }
}

/// Decode body bytes to text using a charset label, UTF-8 when absent.
///
/// Unknown labels fall back to UTF-8. Malformed sequences are replaced with
/// U+FFFD rather than failing the fetch.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = match charset {
        Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
            tracing::warn!(charset = label, "unknown charset, decoding as UTF-8");
            UTF_8
        }),
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = used.name(), "body contained malformed sequences");
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn headers_with_encoding(value: &str) -> ResponseHeaders {
        let mut headers = ResponseHeaders::new();
        headers.insert("Content-Encoding", value);
        headers
    }

    #[test]
    fn test_coding_from_headers() {
        assert_eq!(ContentCoding::from_headers(&ResponseHeaders::new()).unwrap(), ContentCoding::Identity);
        assert_eq!(ContentCoding::from_headers(&headers_with_encoding("identity")).unwrap(), ContentCoding::Identity);
        assert_eq!(ContentCoding::from_headers(&headers_with_encoding("GZIP")).unwrap(), ContentCoding::Gzip);
    }

    #[test]
    fn test_coding_unsupported() {
        for value in ["br", "deflate", "zstd", "gzip, br"] {
            let result = ContentCoding::from_headers(&headers_with_encoding(value));
            assert!(matches!(result, Err(Error::UnsupportedEncoding(_))), "{value} should be unsupported");
        }
    }

    #[test]
    fn test_gzip_decode() {
        let compressed = gzip(b"<body>compressed</body>");
        let out = ContentCoding::Gzip.decode(&compressed, 1024).unwrap();
        assert_eq!(out, b"<body>compressed</body>");
    }

    #[test]
    fn test_gzip_decode_corrupt() {
        let result = ContentCoding::Gzip.decode(b"definitely not gzip", 1024);
        assert!(matches!(result, Err(Error::ProtocolFraming(_))));
    }

    #[test]
    fn test_gzip_decode_limit() {
        let compressed = gzip(&[b'a'; 4096]);
        let result = ContentCoding::Gzip.decode(&compressed, 100);
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[test]
    fn test_decode_text_default_utf8() {
        assert_eq!(decode_text("héllo".as_bytes(), None), "héllo");
    }

    #[test]
    fn test_decode_text_latin1() {
        assert_eq!(decode_text(&[0x63, 0x61, 0x66, 0xE9], Some("ISO-8859-1")), "café");
    }

    #[test]
    fn test_decode_text_unknown_label() {
        assert_eq!(decode_text(b"plain", Some("x-no-such-charset")), "plain");
    }

    #[test]
    fn test_decode_text_lossy() {
        assert_eq!(decode_text(&[b'a', 0xFF, b'b'], Some("utf-8")), "a\u{FFFD}b");
    }
}
