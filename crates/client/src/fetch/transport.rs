//! Connection establishment for network locators.
//!
//! `http` locators get a plain TCP stream; `https` locators get the same
//! stream wrapped in a rustls client session verified against the host name.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use wisp_core::Error;

use crate::locator::{NetworkTarget, Scheme};

/// A duplex byte stream carrying one request/response exchange.
pub trait Stream: Read + Write + Send {}

impl<T: Read + Write + Send> Stream for T {}

/// Opens connections for network locators.
///
/// The fetcher calls `connect` once per exchange and drops the returned
/// stream when the exchange ends, which closes the connection.
pub trait Connector: Send + Sync {
    fn connect(&self, target: &NetworkTarget) -> Result<Box<dyn Stream>, Error>;
}

/// TCP connector with rustls for `https`.
pub struct TcpConnector {
    tls: Arc<ClientConfig>,
}

impl TcpConnector {
    /// Create a connector trusting the bundled webpki root certificates.
    pub fn new() -> Result<Self, Error> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(format!("failed to build TLS config: {e}")))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self::with_tls_config(Arc::new(config)))
    }

    /// Create a connector using a caller-provided TLS configuration.
    pub fn with_tls_config(tls: Arc<ClientConfig>) -> Self {
        Self { tls }
    }
}

impl Connector for TcpConnector {
    fn connect(&self, target: &NetworkTarget) -> Result<Box<dyn Stream>, Error> {
        let tcp = TcpStream::connect((target.host.as_str(), target.port))?;

        match target.scheme {
            Scheme::Https => {
                let server_name = ServerName::try_from(target.host.clone())
                    .map_err(|e| Error::Tls(format!("invalid server name {}: {e}", target.host)))?;
                let session = ClientConnection::new(Arc::clone(&self.tls), server_name)
                    .map_err(|e| Error::Tls(format!("failed to start TLS session: {e}")))?;
                Ok(Box::new(StreamOwned::new(session, tcp)))
            }
            _ => Ok(Box::new(tcp)),
        }
    }
}
