//! Network-backed chain source.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use log::debug;
use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, ServerName};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;

use crate::config::{DEFAULT_USER_AGENT, HTTPS_PORT, TRANSFER_TIMEOUT};
use crate::error_handling::{FetchError, InitializationError};

use super::verifier::AcceptAnyCertificate;
use super::ChainSource;

/// Fetches certificate chains over real TLS connections.
///
/// Connect, handshake and the request write share one deadline, the
/// transfer timeout. Server certificates are never validated.
pub struct TlsChainSource {
    connector: TlsConnector,
    transfer_timeout: Duration,
    user_agent: String,
    port: u16,
}

impl TlsChainSource {
    /// Builds the client configuration.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::TlsUnavailableError` if the crypto provider
    /// supports none of the default protocol versions.
    pub fn new(
        transfer_timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Result<Self, InitializationError> {
        let provider = Arc::new(default_provider());
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| InitializationError::TlsUnavailableError(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate::new(provider)))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            transfer_timeout,
            user_agent: user_agent.into(),
            port: HTTPS_PORT,
        })
    }

    /// Source with the default timeout and user agent.
    pub fn with_defaults() -> Result<Self, InitializationError> {
        Self::new(TRANSFER_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Contacts hosts on `port` instead of 443.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn fetch(&self, hostname: &str) -> Result<Vec<CertificateDer<'static>>, FetchError> {
        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|e| FetchError::InvalidHostname(format!("{hostname}: {e}")))?;

        match tokio::time::timeout(self.transfer_timeout, self.handshake(hostname, server_name))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                debug!(
                    "Transfer timeout for {hostname} after {}ms",
                    self.transfer_timeout.as_millis()
                );
                Err(FetchError::Timeout)
            }
        }
    }

    async fn handshake(
        &self,
        hostname: &str,
        server_name: ServerName<'static>,
    ) -> Result<Vec<CertificateDer<'static>>, FetchError> {
        debug!("Connecting to {hostname}:{}", self.port);
        let sock = TcpStream::connect((hostname, self.port))
            .await
            .map_err(|e| FetchError::Connect(e.to_string()))?;

        let mut tls_stream = self
            .connector
            .connect(server_name, sock)
            .await
            .map_err(handshake_error)?;

        let chain: Vec<CertificateDer<'static>> = tls_stream
            .get_ref()
            .1
            .peer_certificates()
            .map(|certs| certs.to_vec())
            .unwrap_or_default();

        // The chain is already in hand; a server hanging up here changes nothing
        if let Err(e) = send_request(&mut tls_stream, hostname, &self.user_agent).await {
            debug!("Failed to send request to {hostname}: {e}");
        }

        if chain.is_empty() {
            return Err(FetchError::NoPeerCertificates);
        }
        debug!("{hostname} presented {} certificate(s)", chain.len());
        Ok(chain)
    }
}

/// Writes one `GET /` carrying the user agent, then flushes and closes the
/// write side so the request leaves the TLS buffer before the stream drops.
async fn send_request<W>(stream: &mut W, hostname: &str, user_agent: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let request = format!(
        "GET / HTTP/1.1\r\n\
         Host: {hostname}\r\n\
         User-Agent: {user_agent}\r\n\
         Connection: close\r\n\
         \r\n"
    );
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await
}

/// TLS protocol failures surface as `InvalidData`; anything else is the transport.
fn handshake_error(e: std::io::Error) -> FetchError {
    match e.kind() {
        std::io::ErrorKind::InvalidData => FetchError::Handshake(e.to_string()),
        _ => FetchError::Io(e.to_string()),
    }
}

impl ChainSource for TlsChainSource {
    fn fetch_chain<'a>(
        &'a self,
        hostname: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CertificateDer<'static>>, FetchError>> {
        Box::pin(self.fetch(hostname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_client_config() {
        let source = TlsChainSource::new(Duration::from_millis(100), "test-agent").unwrap();
        assert_eq!(source.port, HTTPS_PORT);
        assert_eq!(source.transfer_timeout, Duration::from_millis(100));
        assert!(source.tls_available().is_ok());
    }

    #[test]
    fn test_with_port_overrides_default() {
        let source = TlsChainSource::with_defaults().unwrap().with_port(8443);
        assert_eq!(source.port, 8443);
    }

    #[tokio::test]
    async fn test_invalid_hostname_is_rejected_before_connecting() {
        let source = TlsChainSource::with_defaults().unwrap();
        let err = source.fetch_chain("not a hostname").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidHostname(_)));
    }

    #[tokio::test]
    async fn test_request_is_flushed_and_closed() {
        use tokio::io::AsyncReadExt;

        let (mut client, mut server) = tokio::io::duplex(1024);
        send_request(&mut client, "a.example", "test-agent")
            .await
            .unwrap();

        // Reading to the end only returns once the write side is shut down
        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert!(received.starts_with("GET / HTTP/1.1\r\n"));
        assert!(received.contains("Host: a.example\r\n"));
        assert!(received.contains("User-Agent: test-agent\r\n"));
        assert!(received.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_handshake_error_mapping() {
        let tls = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad record");
        assert!(matches!(handshake_error(tls), FetchError::Handshake(_)));
        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(handshake_error(reset), FetchError::Io(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        // Bind then drop to get a local port with nothing listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let source = TlsChainSource::new(Duration::from_secs(2), "test-agent")
            .unwrap()
            .with_port(port);
        let err = source.fetch_chain("127.0.0.1").await.unwrap_err();
        assert!(
            matches!(err, FetchError::Connect(_)),
            "unexpected error: {err:?}"
        );
    }
}
