//! Locator retrieval.
//!
//! ### Schemes
//! - `file`: read the path as UTF-8; a missing file yields the body `"File Not Found"`.
//! - `data`: percent-decode (or base64-decode) the inline payload.
//! - `http`/`https`: one `GET` over one connection, closed when the exchange ends.
//!
//! ### Response handling
//! - Status must be `200`; redirects are followed only when `max_redirects > 0`.
//! - Body framing: chunked, then `content-length`, then read to close.
//! - `gzip` content-encoding is undone; other codings fail with `UnsupportedEncoding`.
//! - Text is decoded with the `content-type` charset, UTF-8 by default.

pub mod chunked;
pub mod decode;
pub mod inline;
pub mod redirect;
pub mod response;
pub mod transport;

use std::io::BufReader;
use std::path::{Path, PathBuf};

use wisp_core::{AppConfig, Error};

pub use decode::{ContentCoding, decode_text};
pub use response::{ResponseHeaders, StatusLine};
pub use transport::{Connector, Stream, TcpConnector};

use crate::locator::{FileTarget, Locator, NetworkTarget, Target};

/// Body returned for `file` locators whose path does not exist.
pub const FILE_NOT_FOUND_BODY: &str = "File Not Found";

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Document served for `file` locators with an empty or `/` path.
    pub default_document: PathBuf,

    /// Maximum number of redirects to follow (default: 0, redirects are errors)
    pub max_redirects: usize,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        AppConfig::default().into()
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_document: config.default_document.clone(),
            max_redirects: config.max_redirects,
            max_bytes: config.max_bytes,
        }
    }
}

impl From<AppConfig> for FetchConfig {
    fn from(config: AppConfig) -> Self {
        (&config).into()
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Response headers; present only for network locators.
    pub headers: Option<ResponseHeaders>,
    /// Decoded body text
    pub body: String,
}

impl FetchResponse {
    fn local(body: String) -> Self {
        Self { headers: None, body }
    }

    pub fn into_parts(self) -> (Option<ResponseHeaders>, String) {
        (self.headers, self.body)
    }
}

enum Exchange {
    Done(FetchResponse),
    Redirect(String),
}

/// Scheme-dispatching fetcher.
pub struct Fetcher {
    config: FetchConfig,
    connector: Box<dyn Connector>,
}

impl Fetcher {
    /// Create a fetcher that connects over TCP, with rustls for `https`.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        Ok(Self::with_connector(config, TcpConnector::new()?))
    }

    /// Create a fetcher that opens connections through `connector`.
    pub fn with_connector(config: FetchConfig, connector: impl Connector + 'static) -> Self {
        Self { config, connector: Box::new(connector) }
    }

    /// Retrieve the resource a locator points at.
    ///
    /// # Errors
    ///
    /// - `UnexpectedStatus` for a non-200 status that is not a followed redirect
    /// - `ProtocolFraming` for malformed or truncated responses
    /// - `UnsupportedEncoding` for content codings other than gzip
    /// - `TooManyRedirects`, `FetchTooLarge`, `Tls`, `Io` as their names say
    ///
    /// A missing local file is not an error; see [`FILE_NOT_FOUND_BODY`].
    pub fn request(&self, locator: &Locator) -> Result<FetchResponse, Error> {
        match locator.target() {
            Target::File(target) => self.request_file(target),
            Target::Data(target) => inline::decode_data(target).map(FetchResponse::local),
            Target::Network(target) => self.request_network(target),
        }
    }

    fn request_file(&self, target: &FileTarget) -> Result<FetchResponse, Error> {
        let path = match target.path.as_str() {
            "" | "/" => self.config.default_document.as_path(),
            other => Path::new(other),
        };

        match std::fs::read_to_string(path) {
            Ok(body) => {
                tracing::debug!(path = %path.display(), bytes = body.len(), "read local file");
                Ok(FetchResponse::local(body))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "local file not found");
                Ok(FetchResponse::local(FILE_NOT_FOUND_BODY.to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn request_network(&self, target: &NetworkTarget) -> Result<FetchResponse, Error> {
        let mut current = target.clone();
        let mut redirects = 0;

        loop {
            match self.exchange(&current)? {
                Exchange::Done(response) => return Ok(response),
                Exchange::Redirect(location) => {
                    if redirects == self.config.max_redirects {
                        return Err(Error::TooManyRedirects(redirects));
                    }
                    redirects += 1;
                    let next = redirect::resolve(&current, &location)?;
                    tracing::debug!(from = %current.path, to = %location, redirects, "following redirect");
                    current = next;
                }
            }
        }
    }

    /// One request/response over one connection. The stream is dropped, and
    /// the connection closed, on every return path.
    fn exchange(&self, target: &NetworkTarget) -> Result<Exchange, Error> {
        let mut stream = self.connector.connect(target)?;
        tracing::debug!(scheme = %target.scheme, host = %target.host, port = target.port, "connection opened");

        let result = self
            .send_request(stream.as_mut(), target)
            .and_then(|()| self.read_response(stream));

        tracing::debug!(host = %target.host, "connection closed");
        result
    }

    fn send_request(&self, stream: &mut dyn Stream, target: &NetworkTarget) -> Result<(), Error> {
        let request = build_request(target);
        tracing::debug!(request_line = %request.lines().next().unwrap_or_default(), "sending request");
        stream.write_all(request.as_bytes())?;
        stream.flush()?;
        Ok(())
    }

    fn read_response(&self, stream: Box<dyn Stream>) -> Result<Exchange, Error> {
        let mut reader = BufReader::new(stream);

        let status = response::read_status_line(&mut reader)?;
        tracing::debug!(code = status.code, reason = %status.reason, "received status line");

        let follow = self.config.max_redirects > 0 && redirect::is_redirect(status.code);
        if status.code != 200 && !follow {
            return Err(Error::UnexpectedStatus { code: status.code, reason: status.reason });
        }

        let headers = response::read_headers(&mut reader)?;

        if status.code != 200 {
            return match headers.get("location") {
                Some(location) => Ok(Exchange::Redirect(location.to_string())),
                None => Err(Error::UnexpectedStatus { code: status.code, reason: status.reason }),
            };
        }

        let coding = ContentCoding::from_headers(&headers)?;
        let raw = response::read_body(&mut reader, &headers, self.config.max_bytes)?;
        let bytes = coding.decode(&raw, self.config.max_bytes)?;
        let body = decode_text(&bytes, headers.charset());

        tracing::debug!(bytes = bytes.len(), chunked = headers.is_chunked(), ?coding, "read response body");
        Ok(Exchange::Done(FetchResponse { headers: Some(headers), body }))
    }
}

/// Serialize the request: `GET <path> HTTP/1.1`, one line per header, blank line.
pub fn build_request(target: &NetworkTarget) -> String {
    let mut request = format!("GET {} HTTP/1.1\r\n", target.path);
    for (name, value) in target.headers.iter() {
        request.push_str(name);
        request.push_str(": ");
        request.push_str(value);
        request.push_str("\r\n");
    }
    request.push_str("\r\n");
    request
}
