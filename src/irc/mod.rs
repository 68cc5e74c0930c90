//! IRC protocol layer: line parsing, user-command parsing, SASL, and the
//! server connection.

pub mod commands;
pub mod connection;
pub mod message;
pub mod sasl;
