//! Core session logic: state, events, and the dispatcher that turns events
//! into actions.

pub mod action;
pub mod event;
pub mod handler;
pub mod state;
