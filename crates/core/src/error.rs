//! Unified error types for wisp.
//!
//! Every variant is fatal to the fetch that raised it. A missing local file is
//! not an error: the fetcher answers it with a sentinel body instead.

/// Unified error types for the wisp fetch and render pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The locator string could not be parsed (unknown scheme, missing `://`
    /// or `,`, bad port, bad inline payload).
    #[error("MALFORMED_LOCATOR: {0}")]
    MalformedLocator(String),

    /// An operation that is only valid for another kind of locator.
    #[error("INVALID_OPERATION: {0}")]
    InvalidOperation(String),

    /// The server answered with a status other than 200.
    #[error("UNEXPECTED_STATUS: {code} {reason}")]
    UnexpectedStatus { code: u16, reason: String },

    /// The response violates HTTP/1.x framing (status line, headers, chunks, length).
    #[error("PROTOCOL_FRAMING: {0}")]
    ProtocolFraming(String),

    /// A content or transfer coding the fetcher does not decode.
    #[error("UNSUPPORTED_ENCODING: {0}")]
    UnsupportedEncoding(String),

    /// The redirect chain exceeded the configured limit.
    #[error("TOO_MANY_REDIRECTS: gave up after {0} redirects")]
    TooManyRedirects(usize),

    /// Response body exceeded the configured size limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// TLS setup failed (configuration or server name).
    #[error("TLS_ERROR: {0}")]
    Tls(String),

    /// Socket or file I/O failed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),
}
