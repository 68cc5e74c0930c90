//! Command-line configuration.

pub mod model;

pub use model::{Cli, Config};
