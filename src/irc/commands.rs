//! User input parser.
//!
//! Turns a typed line into a [`ParsedCommand`]. Lines that start with the
//! configured prefix character are directives, keyed on the single character
//! that follows the prefix; anything else is text for the current channel.

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// Plain text for the current channel.
    Say { text: String },
    /// `<prefix>j <channel>`
    Join { channel: String },
    /// `<prefix>l`
    Leave,
    /// `<prefix>m <target> <text...>`
    Msg { target: String, text: String },
    /// `<prefix>q`
    Quit,
    /// Anything else after the prefix, sent verbatim.
    Raw { command: String },
    /// A directive missing its argument.
    Usage(&'static str),
}

/// Parse one line of user input.
///
/// Returns `None` for lines shorter than two characters.
pub fn parse_command(input: &str, prefix: char) -> Option<ParsedCommand> {
    let mut chars = input.chars();
    let first = chars.next()?;
    let directive = chars.next()?;

    if first != prefix {
        return Some(ParsedCommand::Say {
            text: input.to_string(),
        });
    }

    // Everything after the prefix character.
    let after_prefix = &input[first.len_utf8()..];
    // Everything after the prefix and the directive character.
    let args = &after_prefix[directive.len_utf8()..];

    let cmd = match directive {
        'j' => match input.split_whitespace().nth(1) {
            Some(channel) => ParsedCommand::Join {
                channel: channel.to_string(),
            },
            None => ParsedCommand::Usage("usage: j <channel>"),
        },
        'l' => ParsedCommand::Leave,
        'm' => {
            let mut words = args.split_whitespace();
            match words.next() {
                Some(target) => ParsedCommand::Msg {
                    target: target.to_string(),
                    text: words.collect::<Vec<_>>().join(" "),
                },
                None => ParsedCommand::Usage("usage: m <target> <message>"),
            }
        }
        'q' => ParsedCommand::Quit,
        _ => ParsedCommand::Raw {
            command: after_prefix.to_string(),
        },
    };
    Some(cmd)
}
