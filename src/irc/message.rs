//! Raw IRC line parser.
//!
//! Splits a received protocol line into prefix, command, parameters and
//! trailing text. Parsing never fails: missing pieces come back empty.

/// The literal sequence that introduces the trailing parameter.
const TRAILING_DELIMITER: &str = " :";

/// One received protocol line, broken into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Sender nickname or server name, without any `!user@host` suffix.
    pub prefix: String,
    /// Verb (`PRIVMSG`) or three-digit numeric (`005`).
    pub command: String,
    /// The token right after the command, usually a target.
    pub first_param: String,
    /// Every whitespace-delimited token before the trailing part.
    pub fields: Vec<String>,
    /// Everything after the first ` :`.
    pub trailing: String,
}

impl ParsedMessage {
    /// Positional access into `fields`, empty when out of range.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Parse a raw line received from the server.
pub fn parse(line: &str) -> ParsedMessage {
    let (mut header, trailing) = match line.split_once(TRAILING_DELIMITER) {
        Some((header, trailing)) => (header, trailing),
        None => (line, ""),
    };

    let mut prefix = "";
    if let Some(rest) = header.strip_prefix(':') {
        match rest.split_once(' ') {
            Some((raw_prefix, remainder)) => {
                prefix = raw_prefix;
                header = remainder;
            }
            // `:prefix` with nothing after it: keep the prefix, no command.
            None => {
                prefix = rest;
                header = "";
            }
        }
    }

    let prefix = match prefix.split_once('!') {
        Some((nick, _)) => nick,
        None => prefix,
    };

    let fields: Vec<String> = header.split_whitespace().map(str::to_string).collect();
    let command = fields.first().cloned().unwrap_or_default();
    let first_param = fields.get(1).cloned().unwrap_or_default();

    ParsedMessage {
        prefix: prefix.to_string(),
        command,
        first_param,
        fields,
        trailing: trailing.to_string(),
    }
}
