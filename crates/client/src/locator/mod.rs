//! Locator parsing.
//!
//! A locator is the scheme-qualified address the browser is asked to load:
//!
//! - `http://host[:port]/path` and `https://host[:port]/path`
//! - `file://<path>` (an empty path means the configured default document)
//! - `data:<mimetype>,<payload>`
//!
//! Any of these may be wrapped as `view-source:<locator>` to show markup
//! source instead of rendered text.

mod headers;

use std::fmt;

use wisp_core::Error;
use wisp_core::config::DEFAULT_USER_AGENT;

pub use headers::RequestHeaders;

const VIEW_SOURCE_PREFIX: &str = "view-source:";

/// Locator scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    File,
    Data,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::File => "file",
            Scheme::Data => "data",
        }
    }

    /// Whether locators of this scheme are fetched over the network.
    pub fn is_network(self) -> bool {
        matches!(self, Scheme::Http | Scheme::Https)
    }

    /// Port used when a network locator does not name one.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Scheme::Http => Some(80),
            Scheme::Https => Some(443),
            Scheme::File | Scheme::Data => None,
        }
    }

    fn parse(raw: &str) -> Result<Self, Error> {
        match raw.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "file" => Ok(Scheme::File),
            "data" => Ok(Scheme::Data),
            _ => Err(Error::MalformedLocator(format!("unknown scheme: {raw}"))),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `http`/`https` locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTarget {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Request target, always starting with `/`.
    pub path: String,
    pub headers: RequestHeaders,
}

impl NetworkTarget {
    fn parse(scheme: Scheme, rest: &str, user_agent: &str) -> Result<Self, Error> {
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let default_port = scheme.default_port().unwrap_or(80);
        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| Error::MalformedLocator(format!("invalid port: {port}")))?;
                (host, port)
            }
            None => (authority, default_port),
        };

        if host.is_empty() {
            return Err(Error::MalformedLocator(format!("missing host in {scheme}://{rest}")));
        }

        let mut target = Self {
            scheme,
            host: host.to_string(),
            port,
            path: path.to_string(),
            headers: RequestHeaders::new(),
        };
        target.headers.set("User-Agent", user_agent);
        target.headers.set("Host", target.host_header());
        target.headers.set("Connection", "close");
        Ok(target)
    }

    /// Value of the `Host` header: the host, plus the port when it is not the scheme default.
    pub fn host_header(&self) -> String {
        if Some(self.port) == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// A `file` locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    /// Path as written after `file://`; empty or `/` selects the default document.
    pub path: String,
}

/// A `data` locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTarget {
    pub mime_type: Option<String>,
    /// Payload exactly as written, still percent- or base64-encoded.
    pub data: String,
}

impl DataTarget {
    fn parse(rest: &str) -> Result<Self, Error> {
        let (mime_type, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::MalformedLocator(format!("missing ',' in data:{rest}")))?;

        let mime_type = if mime_type.is_empty() { None } else { Some(mime_type.to_string()) };
        Ok(Self { mime_type, data: data.to_string() })
    }

    /// Whether the media type carries the `;base64` marker.
    pub fn is_base64(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.to_ascii_lowercase().ends_with(";base64"))
    }
}

/// What a locator points at; exactly one kind per scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Network(NetworkTarget),
    File(FileTarget),
    Data(DataTarget),
}

/// A parsed locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    target: Target,
    view_source: bool,
}

impl Locator {
    /// Parse a locator, seeding network headers with the built-in user agent.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        Self::parse_with_user_agent(raw, DEFAULT_USER_AGENT)
    }

    /// Parse a locator, seeding network headers with `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedLocator` if:
    /// - the scheme is missing or not one of `http`, `https`, `file`, `data`
    /// - a network or file locator lacks `://`
    /// - a data locator lacks `,`
    /// - a network locator has no host or a port that is not a `u16`
    pub fn parse_with_user_agent(raw: &str, user_agent: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::MalformedLocator("empty locator".into()));
        }

        let (view_source, rest) = match trimmed.strip_prefix(VIEW_SOURCE_PREFIX) {
            Some(inner) => (true, inner),
            None => (false, trimmed),
        };

        let (scheme, rest) = rest
            .split_once(':')
            .ok_or_else(|| Error::MalformedLocator(format!("missing scheme: {rest}")))?;
        let scheme = Scheme::parse(scheme)?;

        let target = match scheme {
            Scheme::Data => Target::Data(DataTarget::parse(rest)?),
            Scheme::File => Target::File(FileTarget { path: strip_slashes(scheme, rest)?.to_string() }),
            Scheme::Http | Scheme::Https => {
                Target::Network(NetworkTarget::parse(scheme, strip_slashes(scheme, rest)?, user_agent)?)
            }
        };

        Ok(Self { target, view_source })
    }

    /// A `file://` locator for a path on disk.
    pub fn file(path: impl Into<String>) -> Self {
        Self { target: Target::File(FileTarget { path: path.into() }), view_source: false }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn into_target(self) -> Target {
        self.target
    }

    pub fn scheme(&self) -> Scheme {
        match &self.target {
            Target::Network(t) => t.scheme,
            Target::File(_) => Scheme::File,
            Target::Data(_) => Scheme::Data,
        }
    }

    pub fn view_source(&self) -> bool {
        self.view_source
    }

    pub fn host(&self) -> Option<&str> {
        match &self.target {
            Target::Network(t) => Some(&t.host),
            _ => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match &self.target {
            Target::Network(t) => Some(t.port),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match &self.target {
            Target::Network(t) => Some(&t.path),
            Target::File(t) => Some(&t.path),
            Target::Data(_) => None,
        }
    }

    /// Request headers; only network locators have them.
    pub fn headers(&self) -> Option<&RequestHeaders> {
        match &self.target {
            Target::Network(t) => Some(&t.headers),
            _ => None,
        }
    }

    /// Add or override a request header.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` for `file` and `data` locators.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), Error> {
        self.set_headers([(name.into(), value.into())])
    }

    /// Add or override several request headers at once.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` for `file` and `data` locators.
    pub fn set_headers<I, K, V>(&mut self, headers: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let scheme = self.scheme();
        if !scheme.is_network() {
            return Err(Error::InvalidOperation(format!(
                "headers can only be set on http/https locators, not {scheme}"
            )));
        }
        if let Target::Network(t) = &mut self.target {
            t.headers.extend(headers);
        }
        Ok(())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.view_source {
            f.write_str(VIEW_SOURCE_PREFIX)?;
        }
        match &self.target {
            Target::Network(t) => write!(f, "{}://{}{}", t.scheme, t.host_header(), t.path),
            Target::File(t) => write!(f, "file://{}", t.path),
            Target::Data(t) => write!(f, "data:{},{}", t.mime_type.as_deref().unwrap_or(""), t.data),
        }
    }
}

impl std::str::FromStr for Locator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn strip_slashes(scheme: Scheme, rest: &str) -> Result<&str, Error> {
    rest.strip_prefix("//")
        .ok_or_else(|| Error::MalformedLocator(format!("missing '://' after {scheme}")))
}
