//! Diagnostics and transcript logging.
//!
//! Diagnostics go through `tracing`. Since stdout is the chat console, they
//! are written to `minirc.log` in the platform data directory unless
//! `--debug` sends them to stderr.
//!
//! When a transcript directory is configured, every console line is also
//! appended to `<target>_<date>.log` in that directory.

use crate::ui::console::ConsoleLine;
use anyhow::{Context, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "minirc.log";
const DEFAULT_FILTER: &str = "minirc=info";

/// Directory holding the diagnostic log.
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("minirc")
}

/// Install the global tracing subscriber.
pub fn init_tracing(debug: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if debug {
        builder.with_writer(io::stderr).init();
        return Ok(());
    }

    let dir = data_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    builder
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Appends console lines to per-target daily files.
///
/// File handles are cached for the lifetime of the logger.
pub struct TranscriptLogger {
    log_dir: PathBuf,
    file_handles: HashMap<String, File>,
}

impl TranscriptLogger {
    pub fn new(log_dir: &Path) -> Self {
        Self {
            log_dir: expand_home(log_dir),
            file_handles: HashMap::new(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Append `line` to the file for its target and the day it was stamped.
    pub fn log_line(&mut self, line: &ConsoleLine) -> io::Result<()> {
        let date = line.timestamp.split(' ').next().unwrap_or_default();
        let filename = format!("{}_{}.log", sanitize_target(&line.target), date);

        let handle = match self.file_handles.entry(filename) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                fs::create_dir_all(&self.log_dir)?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.log_dir.join(entry.key()))?;
                entry.insert(file)
            }
        };

        writeln!(handle, "[{}] {}", line.timestamp, line.text)
    }
}

/// Keep only characters that are safe in a file name.
fn sanitize_target(target: &str) -> String {
    let safe: String = target
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "_".to_string()
    } else {
        safe
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(target: &str, text: &str) -> ConsoleLine {
        ConsoleLine {
            target: target.into(),
            timestamp: "2026-10-18 09:30".into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_sanitize_target() {
        assert_eq!(sanitize_target("#rust"), "_rust");
        assert_eq!(sanitize_target("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_target("irc.libera.chat"), "irc.libera.chat");
        assert_eq!(sanitize_target(""), "_");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/var/log")), PathBuf::from("/var/log"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/irc")), home.join("irc"));
        }
    }

    #[test]
    fn test_transcript_appends_per_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = TranscriptLogger::new(dir.path());

        logger.log_line(&line("#rust", "<bob> hi")).unwrap();
        logger.log_line(&line("#rust", "<crab> hello")).unwrap();
        logger.log_line(&line("bob", "<bob> psst")).unwrap();

        let rust = fs::read_to_string(dir.path().join("_rust_2026-10-18.log")).unwrap();
        assert_eq!(
            rust,
            "[2026-10-18 09:30] <bob> hi\n[2026-10-18 09:30] <crab> hello\n"
        );
        let bob = fs::read_to_string(dir.path().join("bob_2026-10-18.log")).unwrap();
        assert_eq!(bob, "[2026-10-18 09:30] <bob> psst\n");
    }

    #[test]
    fn test_transcript_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("irc");
        let mut logger = TranscriptLogger::new(&nested);
        logger.log_line(&line("*", "error: no channel to send to")).unwrap();
        assert!(nested.join("__2026-10-18.log").exists());
    }
}
