//! One-shot connection transport.
//!
//! Opens a TCP (optionally TLS) connection, performs the HTTP/1.1
//! handshake and hands back a sender. One connection per physical attempt;
//! there is no pooling or keep-alive reuse. Redirects are never followed
//! at this layer.

use crate::error::Error;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use url::Url;

static TLS_CONFIG: OnceLock<Arc<rustls::ClientConfig>> = OnceLock::new();

fn tls_connector() -> TlsConnector {
    let config = TLS_CONFIG.get_or_init(|| {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth(),
        )
    });
    TlsConnector::from(config.clone())
}

/// An established HTTP/1.1 connection to one origin.
pub(crate) struct Connection {
    sender: http1::SendRequest<Full<Bytes>>,
}

impl Connection {
    /// Open a connection to the URL's origin within `connect_timeout`.
    /// The TLS and HTTP handshakes count against the same budget.
    pub(crate) async fn open(url: &Url, connect_timeout: Duration) -> Result<Self, Error> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(url.to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidUrl(url.to_string()))?;

        match tokio::time::timeout(connect_timeout, Self::handshake(url, &host, port)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::ConnectTimeout {
                url: url.clone(),
                timeout: connect_timeout,
            }),
        }
    }

    async fn handshake(url: &Url, host: &str, port: u16) -> Result<Self, Error> {
        tracing::debug!(%url, "opening connection");
        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|source| Error::Connection {
                url: url.clone(),
                source,
            })?;

        let sender = if url.scheme() == "https" {
            let server_name = ServerName::try_from(host.to_string())
                .map_err(|_| Error::InvalidUrl(url.to_string()))?;
            let tls = tls_connector()
                .connect(server_name, tcp)
                .await
                .map_err(|source| Error::Connection {
                    url: url.clone(),
                    source,
                })?;
            drive(TokioIo::new(tls), url).await?
        } else {
            drive(TokioIo::new(tcp), url).await?
        };

        Ok(Self { sender })
    }

    /// Transmit the request and wait for status line and headers within
    /// `read_timeout`. The body stream is left unread for the caller.
    pub(crate) async fn send(
        &mut self,
        request: http::Request<Full<Bytes>>,
        url: &Url,
        read_timeout: Duration,
    ) -> Result<http::Response<Incoming>, Error> {
        match tokio::time::timeout(read_timeout, self.sender.send_request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(Error::Connection {
                url: url.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            }),
            Err(_) => Err(Error::ReadTimeout {
                url: url.clone(),
                timeout: read_timeout,
            }),
        }
    }
}

/// HTTP/1.1 handshake plus a spawned driver task that owns the socket
/// until the exchange completes.
async fn drive<I>(io: I, url: &Url) -> Result<http1::SendRequest<Full<Bytes>>, Error>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (sender, conn) = http1::handshake(io)
        .await
        .map_err(|e| Error::Connection {
            url: url.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "connection driver finished with error");
        }
    });

    Ok(sender)
}
