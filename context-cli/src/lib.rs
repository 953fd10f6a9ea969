//! # context-cli
//!
//! Operator CLI for stored dialogue contexts: argument parsing, env config, tracing setup and the
//! subcommands themselves.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logger;

pub use cli::{Cli, Commands, Target};
pub use config::CliConfig;
pub use logger::init_tracing;
