mod app;
mod config;
mod error;
mod irc;
mod logging;
mod ui;

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::handler;
use crate::app::state::AppState;
use crate::config::{Cli, Config};
use crate::irc::connection::{self, spawn_line_reader, Connection};
use crate::logging::TranscriptLogger;
use crate::ui::console::{self, ConsoleLine};
use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Capacity of the queue shared by the stdin and server readers.
const EVENT_QUEUE_SIZE: usize = 64;

/// How long a parting `QUIT` may take after Ctrl-C.
const QUIT_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = match Config::from_cli(Cli::parse()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_tracing(cfg.debug)?;
    info!(host = %cfg.host, port = cfg.port, tls = cfg.tls, sasl = cfg.credentials.sasl, "starting");

    let code = match run(cfg).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    };

    // The stdin reader sits in a blocking read that would keep the runtime
    // alive, so leave without waiting for it.
    std::process::exit(code);
}

async fn run(cfg: Config) -> Result<i32> {
    let (server_reader, mut conn) = connection::connect(&cfg)
        .await
        .with_context(|| format!("Failed to connect to {}", cfg.addr()))?;

    let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(EVENT_QUEUE_SIZE);
    spawn_line_reader(
        server_reader,
        event_tx.clone(),
        AppEvent::ServerLine,
        |reason| AppEvent::ServerClosed { reason },
    );
    spawn_line_reader(tokio::io::stdin(), event_tx, AppEvent::Input, |reason| {
        AppEvent::InputClosed { reason }
    });

    let mut state = AppState::new(cfg.credentials.clone(), cfg.prefix);
    let mut transcript = cfg.log_dir.as_deref().map(TranscriptLogger::new);
    if let Some(logger) = &transcript {
        info!(dir = %logger.log_dir().display(), "transcript logging enabled");
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(%e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    event_loop(&mut state, &mut event_rx, &mut conn, &mut transcript, shutdown).await
}

/// Process events one at a time until an `Exit` action, the end of the queue,
/// or `shutdown` resolving. Returns the exit status.
///
/// `shutdown` is polled for the whole life of the loop, including while a
/// line is being written.
async fn event_loop<F>(
    state: &mut AppState,
    event_rx: &mut mpsc::Receiver<AppEvent>,
    conn: &mut Connection,
    transcript: &mut Option<TranscriptLogger>,
    shutdown: F,
) -> Result<i32>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let event = tokio::select! {
            event = event_rx.recv() => event,
            _ = &mut shutdown => {
                info!("interrupted");
                send_quit(conn).await;
                return Ok(0);
            }
        };
        // Both readers report closure before dropping their sender.
        let Some(event) = event else { return Ok(1) };

        for action in handler::handle_event(state, event) {
            match action {
                Action::Send(line) => {
                    tokio::select! {
                        result = conn.send_line(&line) => result?,
                        _ = &mut shutdown => {
                            info!(%line, "interrupted while writing");
                            return Ok(0);
                        }
                    }
                }
                Action::Print { target, text } => {
                    show(transcript, ConsoleLine::new(target, text))?
                }
                Action::Error(msg) => show(transcript, ConsoleLine::error(&msg))?,
                Action::Exit(code) => {
                    info!(code, "exiting");
                    return Ok(code);
                }
            }
        }
    }
}

/// Best-effort `QUIT` on the way out.
async fn send_quit(conn: &mut Connection) {
    match tokio::time::timeout(QUIT_TIMEOUT, conn.send_line("QUIT")).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(%e, "could not send QUIT"),
        Err(_) => warn!("timed out sending QUIT"),
    }
}

fn show(transcript: &mut Option<TranscriptLogger>, line: ConsoleLine) -> Result<()> {
    console::print_line(&line).context("Failed to write to the console")?;
    if let Some(logger) = transcript {
        if let Err(e) = logger.log_line(&line) {
            warn!(%e, channel = %line.target, "transcript write failed");
        }
    }
    Ok(())
}
