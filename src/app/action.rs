/// Side effects requested by the dispatcher, executed in order by the
/// event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write one protocol line (without `\r\n`) to the server.
    Send(String),
    /// Show a console line under `target`.
    Print { target: String, text: String },
    /// Show a user-facing error; the session continues.
    Error(String),
    /// Stop the client with this exit status.
    Exit(i32),
}

impl Action {
    pub fn send(line: impl Into<String>) -> Self {
        Self::Send(line.into())
    }

    pub fn print(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Print {
            target: target.into(),
            text: text.into(),
        }
    }
}
