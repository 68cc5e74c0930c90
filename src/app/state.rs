use crate::config::model::Credentials;

/// Mutable per-connection state, touched only by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Target of plain typed text; empty when no channel is selected.
    pub current_channel: String,
    /// Most recent sender prefix, reused by lines that carry none.
    pub last_prefix: String,
}

impl SessionState {
    pub fn has_channel(&self) -> bool {
        !self.current_channel.is_empty()
    }
}

/// Everything the dispatcher needs for one session.
#[derive(Debug, Clone)]
pub struct AppState {
    pub session: SessionState,
    pub credentials: Credentials,
    /// Character that introduces a directive in typed input.
    pub command_prefix: char,
    /// Set once the user asked to quit, so a closing socket is expected.
    pub quitting: bool,
}

impl AppState {
    pub fn new(credentials: Credentials, command_prefix: char) -> Self {
        Self {
            session: SessionState::default(),
            credentials,
            command_prefix,
            quitting: false,
        }
    }

    pub fn nick(&self) -> &str {
        &self.credentials.nick
    }
}
