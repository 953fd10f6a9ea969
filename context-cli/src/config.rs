//! CLI config: Redis connection, logging and context key settings. Loaded from env.

use anyhow::Result;
use context_core::ContextConfig;
use std::env;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// REDIS_URL
    pub redis_url: String,
    /// LOG_FILE; logs go to stdout only when unset
    pub log_file: Option<String>,
    /// CONTEXT_PREFIX / CONTEXT_TTL_SECS
    pub context: ContextConfig,
}

impl CliConfig {
    /// Load from environment variables. `redis_url` overrides REDIS_URL if provided.
    pub fn load(redis_url: Option<String>) -> Result<Self> {
        let redis_url = redis_url
            .or_else(|| env::var("REDIS_URL").ok())
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
        let log_file = env::var("LOG_FILE").ok().filter(|s| !s.is_empty());
        let context = ContextConfig::load()?;

        Ok(Self {
            redis_url,
            log_file,
            context,
        })
    }
}
