/// Everything the dispatch loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A line typed by the user.
    Input(String),
    /// Standard input reached EOF or failed.
    InputClosed { reason: String },
    /// A line received from the server, surrounding whitespace removed.
    ServerLine(String),
    /// The server connection was closed or failed.
    ServerClosed { reason: String },
}
