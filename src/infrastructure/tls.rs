use std::sync::Arc;
use tokio_rustls::TlsConnector;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use crate::application::HttpVersion;
use crate::domain::{TlsSummary, HopstatError};
use crate::ports::{TlsHandshaker, TlsSession, BoxedIoStream};

pub struct RustlsTlsHandshaker {
    connector: TlsConnector,
}

impl RustlsTlsHandshaker {
    pub fn new(version: HttpVersion) -> Result<Self, HopstatError> {
        let root_store = rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let builder = match version {
            HttpVersion::Http1 => ClientConfig::builder_with_protocol_versions(&[&rustls::version::TLS12]),
            HttpVersion::Http11 | HttpVersion::Http2 => ClientConfig::builder(),
        };
        let mut config = builder.with_root_certificates(root_store).with_no_client_auth();
        config.alpn_protocols = match version {
            HttpVersion::Http2 => vec![b"h2".to_vec(), b"http/1.1".to_vec()],
            HttpVersion::Http1 | HttpVersion::Http11 => vec![b"http/1.1".to_vec()],
        };
        Ok(Self { connector: TlsConnector::from(Arc::new(config)) })
    }
}

impl TlsHandshaker for RustlsTlsHandshaker {
    async fn handshake(&self, stream: BoxedIoStream, host: &str) -> Result<TlsSession, HopstatError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| HopstatError::tls(format!("invalid server name: {}", host)))?;

        let tls_stream = self.connector.connect(server_name, stream).await
            .map_err(|e| HopstatError::tls(format!("TLS handshake failed: {}", e)))?;

        let (_, conn) = tls_stream.get_ref();

        let version = match conn.protocol_version() {
            Some(rustls::ProtocolVersion::TLSv1_2) => "TLS1.2".to_string(),
            Some(rustls::ProtocolVersion::TLSv1_3) => "TLS1.3".to_string(),
            Some(v) => format!("{:?}", v),
            None => "unknown".to_string(),
        };

        let alpn = conn.alpn_protocol().map(|p| String::from_utf8_lossy(p).to_string());
        let cipher = conn.negotiated_cipher_suite().map(|cs| format!("{:?}", cs.suite())).unwrap_or_else(|| "unknown".to_string());

        Ok(TlsSession {
            stream: BoxedIoStream::new(tls_stream),
            summary: TlsSummary::new(version, alpn, cipher),
        })
    }
}
