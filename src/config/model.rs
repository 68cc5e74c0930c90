//! Configuration data model.
//!
//! [`Cli`] is what the user typed; [`Config`] is the validated form the rest
//! of the client works with. Every setting has a default so the client runs
//! with nothing but a nickname.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ClientError;

pub const DEFAULT_HOST: &str = "irc.libera.chat";
pub const PORT_PLAIN: u16 = 6667;
pub const PORT_TLS: u16 = 6697;

#[derive(Debug, Clone, Parser)]
#[command(name = "minirc", about = "A minimal line-oriented IRC client", version)]
pub struct Cli {
    /// Server host.
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server port (6667, or 6697 with --tls).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Nickname.
    #[arg(short, long, env = "USER", default_value = "")]
    pub nick: String,

    /// Server or SASL password.
    #[arg(short = 'k', long = "pass")]
    pub password: Option<String>,

    /// Command prefix character.
    #[arg(short = 'P', long, default_value = "/")]
    pub prefix: String,

    /// Connect with TLS.
    #[arg(short, long)]
    pub tls: bool,

    /// Authenticate with SASL PLAIN.
    #[arg(short, long)]
    pub sasl: bool,

    /// Append every console line to per-channel daily files in this directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Write diagnostics to stderr instead of the log file.
    #[arg(long)]
    pub debug: bool,

    /// Seconds to wait for the TCP/TLS connection.
    #[arg(long, default_value_t = 60)]
    pub connect_timeout: u64,
}

/// Immutable session credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub nick: String,
    pub password: Option<String>,
    pub sasl: bool,
}

impl Credentials {
    /// Password or the empty string.
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub credentials: Credentials,
    pub prefix: char,
    pub log_dir: Option<PathBuf>,
    pub debug: bool,
    pub connect_timeout: Duration,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ClientError> {
        if cli.nick.is_empty() {
            return Err(ClientError::Config("nickname cannot be empty".into()));
        }

        let mut prefix_chars = cli.prefix.chars();
        let prefix = match (prefix_chars.next(), prefix_chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ClientError::Config(
                    "the command prefix should only be one character".into(),
                ))
            }
        };

        let port = match cli.port {
            Some(port) => port,
            None if cli.tls => PORT_TLS,
            None => PORT_PLAIN,
        };

        Ok(Self {
            host: cli.host,
            port,
            tls: cli.tls,
            credentials: Credentials {
                nick: cli.nick,
                password: cli.password.filter(|p| !p.is_empty()),
                sasl: cli.sasl,
            },
            prefix,
            log_dir: cli.log_dir,
            debug: cli.debug,
            connect_timeout: Duration::from_secs(cli.connect_timeout),
        })
    }

    /// `host:port` for dialing.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
