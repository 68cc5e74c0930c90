//! Server transport: dialing, registration, line writing and the reader task.

use crate::app::event::AppEvent;
use crate::config::Config;
use crate::error::ClientError;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

/// Read half of the server connection.
pub type ServerReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write half of the server connection. Writes are direct: no queue, no retry.
pub struct Connection {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl Connection {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Write one protocol line, terminated with `\r\n`.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ClientError> {
        debug!(line, ">>");
        let framed = format!("{line}\r\n");
        let write = async {
            self.writer.write_all(framed.as_bytes()).await?;
            self.writer.flush().await
        };
        write.await.map_err(|source| ClientError::Write {
            line: line.to_string(),
            source,
        })
    }

    /// Send the registration burst for `config`.
    pub async fn register(&mut self, config: &Config) -> Result<(), ClientError> {
        for line in registration_lines(config) {
            self.send_line(&line).await?;
        }
        Ok(())
    }
}

/// Lines sent right after the transport is up.
pub fn registration_lines(config: &Config) -> Vec<String> {
    let creds = &config.credentials;
    let mut lines = Vec::with_capacity(3);
    if creds.sasl {
        lines.push("CAP LS".to_string());
    } else if let Some(password) = &creds.password {
        lines.push(format!("PASS {password}"));
    }
    lines.push(format!("NICK {}", creds.nick));
    lines.push(format!(
        "USER {nick} localhost {host} :{nick}",
        nick = creds.nick,
        host = config.host
    ));
    lines
}

/// Dial the server (TLS if configured) within the connect timeout and send
/// the registration lines.
pub async fn connect(config: &Config) -> Result<(ServerReader, Connection), ClientError> {
    let addr = config.addr();
    let (reader, mut conn) = match tokio::time::timeout(config.connect_timeout, dial(config)).await
    {
        Ok(result) => result?,
        Err(_) => {
            return Err(ClientError::Connect {
                addr,
                source: io::Error::new(io::ErrorKind::TimedOut, "connection timed out"),
            })
        }
    };
    conn.register(config).await?;
    info!(%addr, tls = config.tls, "registered");
    Ok((reader, conn))
}

async fn dial(config: &Config) -> Result<(ServerReader, Connection), ClientError> {
    let addr = config.addr();
    let tcp = TcpStream::connect(&addr)
        .await
        .map_err(|source| ClientError::Connect {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "TCP connected");

    if !config.tls {
        let (reader, writer) = tokio::io::split(tcp);
        let reader: ServerReader = Box::new(reader);
        return Ok((reader, Connection::new(writer)));
    }

    let connector = TlsConnector::from(Arc::new(tls_config()?));
    let server_name = rustls::pki_types::ServerName::try_from(config.host.clone())
        .map_err(|e| ClientError::Tls(format!("invalid server name {}: {e}", config.host)))?;
    let tls = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| ClientError::Tls(format!("handshake with {addr} failed: {e}")))?;
    info!(%addr, "TLS handshake complete");

    let (reader, writer) = tokio::io::split(tls);
    let reader: ServerReader = Box::new(reader);
    Ok((reader, Connection::new(writer)))
}

/// Client config that accepts any server certificate.
fn tls_config() -> Result<rustls::ClientConfig, ClientError> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();
    Ok(config)
}

#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Forward complete lines from `reader` into the event queue.
///
/// Each line has surrounding whitespace removed and is wrapped with
/// `on_line`. EOF or a read error sends one `on_close` event and ends the
/// task. Invalid UTF-8 is replaced rather than treated as an error.
pub fn spawn_line_reader<R>(
    reader: R,
    event_tx: mpsc::Sender<AppEvent>,
    on_line: fn(String) -> AppEvent,
    on_close: fn(String) -> AppEvent,
) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let reason = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break "end of stream".to_string(),
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim().to_string();
                    if event_tx.send(on_line(line)).await.is_err() {
                        return;
                    }
                }
                Err(e) => break e.to_string(),
            }
        };
        let _ = event_tx.send(on_close(reason)).await;
    })
}
