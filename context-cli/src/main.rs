//! dbot-context: show, update, set-state and clear stored contexts in Redis. Config from env and
//! optional CLI args.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use context_cli::{commands, init_tracing, Cli, CliConfig, Commands, Target};
use context_core::MemoryContext;
use context_redis::RedisBackend;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.redis_url.clone())?;
    init_tracing(config.log_file.as_deref())?;
    info!(
        prefix = %config.context.prefix,
        ttl = ?config.context.ttl,
        "Context CLI config loaded"
    );

    let backend = Arc::new(
        RedisBackend::connect(&config.redis_url)
            .with_context(|| format!("Open Redis client for {}", config.redis_url))?,
    );
    let open = |target: Target| {
        MemoryContext::with_backend(
            target.chat,
            target.user,
            backend.clone(),
            config.context.clone(),
        )
    };

    let mut out = io::stdout();
    match cli.command {
        Commands::Show { target } => commands::show(&open(target), &mut out)
            .await
            .context("Read context (check REDIS_URL)"),
        Commands::Key { target } => commands::keys(&open(target), &mut out),
        Commands::SetState {
            target,
            name,
            clear,
        } => {
            let name = if clear { None } else { name };
            commands::set_state(&open(target), name, &mut out)
                .await
                .context("Write context state (check REDIS_URL)")
        }
        Commands::Update { target, values } => commands::update(&open(target), values, &mut out)
            .await
            .map(|_| ())
            .context("Update context data (check REDIS_URL)"),
        Commands::Clear { target } => commands::clear(&open(target), &mut out)
            .await
            .context("Clear context (check REDIS_URL)"),
    }
}
