//! Console line formatting.
//!
//! Each event becomes one line: the target column padded to a fixed display
//! width, a timestamp, and the message body.

use chrono::Local;
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

/// Display width of the target column.
pub const TARGET_WIDTH: usize = 19;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Target used for errors that don't belong to a channel.
pub const ERROR_TARGET: &str = "*";

/// One rendered console event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub target: String,
    pub timestamp: String,
    pub text: String,
}

impl ConsoleLine {
    pub fn new(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            text: text.into(),
        }
    }

    pub fn error(text: &str) -> Self {
        Self::new(ERROR_TARGET, format!("error: {text}"))
    }

    /// `<target padded>: <timestamp> <text>`
    pub fn render(&self) -> String {
        let pad = TARGET_WIDTH.saturating_sub(self.target.width());
        format!(
            "{}{}: {} {}",
            self.target,
            " ".repeat(pad),
            self.timestamp,
            self.text
        )
    }
}

/// Write a line to stdout, flushing so it shows up before the next prompt.
pub fn print_line(line: &ConsoleLine) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", line.render())?;
    out.flush()
}
