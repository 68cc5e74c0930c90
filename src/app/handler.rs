//! The session dispatcher.
//!
//! Reacts to server lines (keepalive, CAP/SASL negotiation, a handful of
//! numerics) and translates typed input into protocol commands. Nothing here
//! does I/O: every effect is returned as an [`Action`] for the event loop.

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::state::AppState;
use crate::error::ClientError;
use crate::irc::commands::{self, ParsedCommand};
use crate::irc::message::{self, ParsedMessage};
use crate::irc::sasl;
use tracing::{debug, info, warn};

const PARTING_MESSAGE: &str = "No rest for the wicked";

pub fn handle_event(state: &mut AppState, event: AppEvent) -> Vec<Action> {
    match event {
        AppEvent::Input(line) => handle_input(state, &line),
        AppEvent::ServerLine(line) => handle_server_line(state, &line),
        AppEvent::InputClosed { reason } => {
            info!(%reason, "input closed");
            vec![Action::Error(format!("input closed: {reason}")), Action::Exit(1)]
        }
        AppEvent::ServerClosed { reason } => {
            if state.quitting {
                info!(%reason, "connection closed after QUIT");
                return vec![Action::Exit(0)];
            }
            warn!(%reason, "connection closed");
            vec![
                Action::Error(format!("connection closed: {reason}")),
                Action::Exit(1),
            ]
        }
    }
}

/// React to one line received from the server.
pub fn handle_server_line(state: &mut AppState, line: &str) -> Vec<Action> {
    debug!(line, "<<");
    let msg = message::parse(line);
    if !msg.prefix.is_empty() {
        state.session.last_prefix = msg.prefix.clone();
    }
    let prefix = state.session.last_prefix.clone();

    match msg.command.as_str() {
        "PING" => {
            let token = if msg.trailing.is_empty() {
                &msg.first_param
            } else {
                &msg.trailing
            };
            vec![Action::send(format!("PONG :{token}"))]
        }
        "PRIVMSG" => vec![Action::print(
            &msg.first_param,
            format!("<{prefix}> {}", msg.trailing),
        )],
        "CAP" => cap_reply(line).into_iter().collect(),
        "AUTHENTICATE" => {
            let nick = state.nick();
            let mut actions = vec![Action::print(
                &prefix,
                status_text(&msg.command, nick, sasl::MECHANISM),
            )];
            let payload = sasl::encode_plain(nick, state.credentials.password());
            actions.extend(sasl::authenticate_lines(&payload).into_iter().map(Action::Send));
            actions
        }
        // ISUPPORT. Tokens that follow a ` :` inside the parameter list end
        // up in `trailing` and are not shown.
        "005" => {
            let supported = msg.fields.get(2..).unwrap_or_default().join(" ");
            vec![Action::print(
                &prefix,
                status_text(&msg.command, state.nick(), &supported),
            )]
        }
        // LUSEROP, LUSERUNKNOWN, LUSERCHANNELS: a count followed by a label.
        "252" | "253" | "254" => {
            let count = msg.field(2);
            let text = if count.is_empty() {
                msg.trailing.clone()
            } else {
                format!("{count} {}", msg.trailing)
            };
            vec![Action::print(
                &prefix,
                status_text(&msg.command, state.nick(), &text),
            )]
        }
        // RPL_SASLSUCCESS
        "903" => {
            info!("SASL authentication succeeded");
            vec![Action::send("CAP END")]
        }
        // ERR_SASLFAIL
        "904" => {
            let mut actions = vec![Action::print(
                &prefix,
                status_text(&msg.command, state.nick(), "SASL: failed"),
            )];
            actions.extend(sasl_abort(&msg));
            actions
        }
        // ERR_SASLTOOLONG, ERR_SASLABORTED
        "905" | "906" => sasl_abort(&msg),
        _ => vec![Action::print(
            &prefix,
            status_text(&msg.command, &msg.first_param, &msg.trailing),
        )],
    }
}

/// Translate one line of user input.
pub fn handle_input(state: &mut AppState, input: &str) -> Vec<Action> {
    let Some(cmd) = commands::parse_command(input, state.command_prefix) else {
        return vec![];
    };

    let result = match cmd {
        ParsedCommand::Say { text } => {
            let channel = state.session.current_channel.clone();
            private_message(state.nick(), &channel, &text)
        }
        ParsedCommand::Join { channel } => {
            let line = format!("JOIN {channel}");
            state.session.current_channel = channel;
            Ok(vec![Action::Send(line)])
        }
        ParsedCommand::Leave => {
            if !state.session.has_channel() {
                return vec![];
            }
            Ok(vec![Action::Send(format!(
                "PART {} :{PARTING_MESSAGE}",
                state.session.current_channel
            ))])
        }
        ParsedCommand::Msg { target, text } => private_message(state.nick(), &target, &text),
        ParsedCommand::Quit => {
            state.quitting = true;
            Ok(vec![Action::send("QUIT")])
        }
        ParsedCommand::Raw { command } => {
            if is_quit(&command) {
                state.quitting = true;
            }
            Ok(vec![Action::Send(command)])
        }
        ParsedCommand::Usage(usage) => return vec![Action::Error(usage.to_string())],
    };

    result.unwrap_or_else(|err| {
        warn!(%err, input, "could not handle input");
        vec![Action::Error(err.to_string())]
    })
}

/// Echo the message locally and send it to `target`.
fn private_message(nick: &str, target: &str, text: &str) -> Result<Vec<Action>, ClientError> {
    if target.is_empty() {
        return Err(ClientError::NoChannel);
    }
    Ok(vec![
        Action::print(target, format!("<{nick}> {text}")),
        Action::Send(format!("PRIVMSG {target} :{text}")),
    ])
}

/// Scan the raw CAP line for the tokens that drive negotiation. The first
/// relevant token wins.
fn cap_reply(line: &str) -> Option<Action> {
    line.split_whitespace()
        .map(|token| token.trim_start_matches(':'))
        .find_map(|token| match token {
            "sasl" => Some(Action::send("CAP REQ :sasl")),
            "ACK" | "NAK" => Some(Action::Send(format!(
                "AUTHENTICATE {}",
                sasl::MECHANISM
            ))),
            _ => None,
        })
}

/// True when a raw command is a `QUIT`, in any case.
fn is_quit(command: &str) -> bool {
    command
        .split_whitespace()
        .next()
        .is_some_and(|verb| verb.eq_ignore_ascii_case("QUIT"))
}

fn sasl_abort(msg: &ParsedMessage) -> Vec<Action> {
    warn!(code = %msg.command, reason = %msg.trailing, "SASL authentication failed");
    vec![Action::send("CAP END"), Action::send("QUIT"), Action::Exit(1)]
}

fn status_text(command: &str, detail: &str, text: &str) -> String {
    format!(">< {command} ({detail}): {text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::Credentials;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    fn state() -> AppState {
        AppState::new(
            Credentials {
                nick: "crab".into(),
                password: Some("hunter2".into()),
                sasl: true,
            },
            '/',
        )
    }

    fn sent(actions: &[Action]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_ping_pong() {
        let mut st = state();
        let actions = handle_server_line(&mut st, "PING :irc.example.net");
        assert_eq!(actions, vec![Action::send("PONG :irc.example.net")]);

        let actions = handle_server_line(&mut st, "PING token");
        assert_eq!(actions, vec![Action::send("PONG :token")]);
    }

    #[test]
    fn test_privmsg_printed_under_target() {
        let mut st = state();
        let actions = handle_server_line(&mut st, ":bob!b@host PRIVMSG #rust :hi all");
        assert_eq!(actions, vec![Action::print("#rust", "<bob> hi all")]);
        assert_eq!(st.session.last_prefix, "bob");
    }

    #[test]
    fn test_last_prefix_carried_over() {
        let mut st = state();
        handle_server_line(&mut st, ":irc.example.net NOTICE * :hello");
        let actions = handle_server_line(&mut st, "251 crab :There are 3 users");
        assert_eq!(
            actions,
            vec![Action::print(
                "irc.example.net",
                ">< 251 (crab): There are 3 users"
            )]
        );
    }

    #[test]
    fn test_sasl_success_path() {
        let mut st = state();
        let actions = handle_server_line(&mut st, ":srv CAP * LS :multi-prefix sasl");
        assert_eq!(sent(&actions), vec!["CAP REQ :sasl"]);

        let actions = handle_server_line(&mut st, "CAP ACK :sasl");
        assert_eq!(sent(&actions), vec!["AUTHENTICATE PLAIN"]);

        let actions = handle_server_line(&mut st, "AUTHENTICATE +");
        let lines = sent(&actions);
        assert_eq!(lines.len(), 1);
        let payload = lines[0].strip_prefix("AUTHENTICATE ").unwrap();
        assert_eq!(BASE64.decode(payload).unwrap(), b"crab\0crab\0hunter2");
        assert!(matches!(&actions[0], Action::Print { text, .. } if text.contains("PLAIN")));

        let actions = handle_server_line(&mut st, ":srv 903 crab :SASL authentication successful");
        assert_eq!(actions, vec![Action::send("CAP END")]);
    }

    #[test]
    fn test_cap_single_capability_and_nak() {
        let mut st = state();
        let actions = handle_server_line(&mut st, ":srv CAP * LS :sasl");
        assert_eq!(sent(&actions), vec!["CAP REQ :sasl"]);

        let actions = handle_server_line(&mut st, ":srv CAP * NAK :sasl");
        assert_eq!(sent(&actions), vec!["AUTHENTICATE PLAIN"]);

        let actions = handle_server_line(&mut st, ":srv CAP * LS :multi-prefix");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_sasl_failures_exit() {
        for code in ["905", "906"] {
            let mut st = state();
            let actions = handle_server_line(&mut st, &format!(":srv {code} crab :nope"));
            assert_eq!(
                actions,
                vec![
                    Action::send("CAP END"),
                    Action::send("QUIT"),
                    Action::Exit(1)
                ]
            );
        }

        let mut st = state();
        let actions = handle_server_line(&mut st, ":srv 904 crab :SASL authentication failed");
        assert_eq!(actions[0], Action::print("srv", ">< 904 (crab): SASL: failed"));
        assert_eq!(&actions[1..], &[
            Action::send("CAP END"),
            Action::send("QUIT"),
            Action::Exit(1)
        ]);
    }

    #[test]
    fn test_isupport_and_luser_numerics() {
        let mut st = state();
        let actions = handle_server_line(
            &mut st,
            ":srv 005 crab CHANTYPES=# NETWORK=Libera :are supported by this server",
        );
        assert_eq!(
            actions,
            vec![Action::print("srv", ">< 005 (crab): CHANTYPES=# NETWORK=Libera")]
        );

        let actions = handle_server_line(&mut st, ":srv 254 crab 42 :channels formed");
        assert_eq!(
            actions,
            vec![Action::print("srv", ">< 254 (crab): 42 channels formed")]
        );

        // Short numerics degrade instead of panicking.
        let actions = handle_server_line(&mut st, ":srv 005");
        assert_eq!(actions, vec![Action::print("srv", ">< 005 (crab): ")]);
        let actions = handle_server_line(&mut st, ":srv 252 :operators");
        assert_eq!(actions, vec![Action::print("srv", ">< 252 (crab): operators")]);
    }

    #[test]
    fn test_unknown_command_status_line() {
        let mut st = state();
        let actions = handle_server_line(&mut st, ":bob!b@h JOIN #rust");
        assert_eq!(actions, vec![Action::print("bob", ">< JOIN (#rust): ")]);
    }

    #[test]
    fn test_join_sets_channel() {
        let mut st = state();
        let actions = handle_input(&mut st, "/j #test");
        assert_eq!(actions, vec![Action::send("JOIN #test")]);
        assert_eq!(st.session.current_channel, "#test");
    }

    #[test]
    fn test_say_to_current_channel() {
        let mut st = state();
        st.session.current_channel = "#test".into();
        let actions = handle_input(&mut st, "hello");
        assert_eq!(
            actions,
            vec![
                Action::print("#test", "<crab> hello"),
                Action::send("PRIVMSG #test :hello"),
            ]
        );
    }

    #[test]
    fn test_say_without_channel_is_error() {
        let mut st = state();
        let actions = handle_input(&mut st, "hello");
        assert_eq!(actions, vec![Action::Error("no channel to send to".into())]);
    }

    #[test]
    fn test_leave() {
        let mut st = state();
        assert!(handle_input(&mut st, "/l").is_empty());

        st.session.current_channel = "#test".into();
        let actions = handle_input(&mut st, "/l");
        assert_eq!(
            actions,
            vec![Action::send("PART #test :No rest for the wicked")]
        );
    }

    #[test]
    fn test_msg_keeps_current_channel() {
        let mut st = state();
        st.session.current_channel = "#test".into();
        let actions = handle_input(&mut st, "/m bob hi there");
        assert_eq!(
            actions,
            vec![
                Action::print("bob", "<crab> hi there"),
                Action::send("PRIVMSG bob :hi there"),
            ]
        );
        assert_eq!(st.session.current_channel, "#test");
    }

    #[test]
    fn test_quit_and_raw() {
        let mut st = state();
        assert_eq!(handle_input(&mut st, "/WHOIS bob"), vec![Action::send("WHOIS bob")]);
        assert_eq!(handle_input(&mut st, "/q"), vec![Action::send("QUIT")]);
        assert!(st.quitting);
        assert_eq!(
            handle_event(&mut st, AppEvent::ServerClosed { reason: "eof".into() }),
            vec![Action::Exit(0)]
        );
    }

    #[test]
    fn test_raw_quit_expects_close() {
        let mut st = state();
        assert_eq!(
            handle_input(&mut st, "/QUIT bye"),
            vec![Action::send("QUIT bye")]
        );
        assert!(st.quitting);
        assert_eq!(
            handle_event(&mut st, AppEvent::ServerClosed { reason: "eof".into() }),
            vec![Action::Exit(0)]
        );

        let mut st = state();
        handle_input(&mut st, "/quit");
        assert!(st.quitting);

        let mut st = state();
        handle_input(&mut st, "/QUITE");
        assert!(!st.quitting);
    }

    #[test]
    fn test_short_input_ignored() {
        let mut st = state();
        assert!(handle_input(&mut st, "x").is_empty());
        assert!(handle_input(&mut st, "").is_empty());
    }

    #[test]
    fn test_stream_closure_exits() {
        let mut st = state();
        let actions = handle_event(&mut st, AppEvent::ServerClosed { reason: "reset".into() });
        assert_eq!(actions.last(), Some(&Action::Exit(1)));

        let actions = handle_event(&mut st, AppEvent::InputClosed { reason: "eof".into() });
        assert_eq!(actions.last(), Some(&Action::Exit(1)));
    }
}
