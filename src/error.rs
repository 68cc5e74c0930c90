//! Error types for the client.

use thiserror::Error;

/// Failures the client distinguishes between.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad command-line settings, detected before dialing.
    #[error("{0}")]
    Config(String),

    /// TCP connect failed or timed out.
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// TLS handshake or server name failure.
    #[error("TLS: {0}")]
    Tls(String),

    /// Writing a protocol line failed.
    #[error("could not write {line:?}: {source}")]
    Write {
        line: String,
        #[source]
        source: std::io::Error,
    },

    /// Plain text typed with no channel selected.
    #[error("no channel to send to")]
    NoChannel,
}
