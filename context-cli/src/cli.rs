//! CLI parser.

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "dbot-context")]
#[command(about = "Inspect and edit stored bot dialogue contexts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Redis URL; overrides REDIS_URL.
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which context to address. An omitted id is stored as `none`.
#[derive(Args, Debug, Clone, Copy)]
pub struct Target {
    #[arg(short, long, allow_negative_numbers = true)]
    pub chat: Option<i64>,
    #[arg(short, long, allow_negative_numbers = true)]
    pub user: Option<i64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the stored data and state.
    Show {
        #[command(flatten)]
        target: Target,
    },
    /// Print the storage keys of a context.
    Key {
        #[command(flatten)]
        target: Target,
    },
    /// Set the state name, or remove it with --clear.
    SetState {
        #[command(flatten)]
        target: Target,
        #[arg(required_unless_present = "clear", conflicts_with = "clear")]
        name: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Merge key=value pairs into the data; values are parsed as JSON, else kept as strings.
    Update {
        #[command(flatten)]
        target: Target,
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, Value)>,
    },
    /// Remove data and state.
    Clear {
        #[command(flatten)]
        target: Target,
    },
}

/// Parses `key=value`. `value` is JSON when it parses as JSON, otherwise a plain string.
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {}", s))?;
    if key.is_empty() {
        return Err(format!("empty key in {}", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
