//! Context storage config: key namespace and expiry. Loaded from env.

use std::env;
use std::time::Duration;

use crate::error::{ContextError, Result};

/// Namespace used when no prefix is configured. Existing persisted keys use it.
pub const DEFAULT_PREFIX: &str = "maxapi:context";

/// Key namespace and expiry applied to every backend write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// CONTEXT_PREFIX, trailing separators stripped
    pub prefix: String,
    /// CONTEXT_TTL_SECS; `None` means keys never expire
    pub ttl: Option<Duration>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            ttl: None,
        }
    }
}

impl ContextConfig {
    /// Builds a config from an explicit prefix and expiry. A zero expiry is treated as none.
    pub fn new(prefix: impl AsRef<str>, ttl: Option<Duration>) -> Self {
        Self {
            prefix: normalize_prefix(prefix.as_ref()),
            ttl: ttl.filter(|d| !d.is_zero()),
        }
    }

    /// Load from environment variables. Unset or unparsable CONTEXT_TTL_SECS means no expiry.
    pub fn load() -> Result<Self> {
        let prefix = env::var("CONTEXT_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
        let ttl = env::var("CONTEXT_TTL_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let config = Self::new(prefix, ttl);
        config.validate()?;
        Ok(config)
    }

    /// An empty prefix would produce keys starting with ':'.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(ContextError::Config(
                "CONTEXT_PREFIX must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches(':').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("CONTEXT_PREFIX");
        env::remove_var("CONTEXT_TTL_SECS");
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();

        let config = ContextConfig::load().unwrap();

        assert_eq!(config.prefix, "maxapi:context");
        assert!(config.ttl.is_none());
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("CONTEXT_PREFIX", "mybot:ctx::");
        env::set_var("CONTEXT_TTL_SECS", "3600");

        let config = ContextConfig::load().unwrap();

        assert_eq!(config.prefix, "mybot:ctx");
        assert_eq!(config.ttl, Some(Duration::from_secs(3600)));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_ignores_bad_ttl() {
        clear_env();
        env::set_var("CONTEXT_TTL_SECS", "soon");
        assert!(ContextConfig::load().unwrap().ttl.is_none());

        env::set_var("CONTEXT_TTL_SECS", "0");
        assert!(ContextConfig::load().unwrap().ttl.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_empty_prefix() {
        clear_env();
        env::set_var("CONTEXT_PREFIX", ":::");
        assert!(matches!(
            ContextConfig::load(),
            Err(ContextError::Config(_))
        ));
        clear_env();
    }
}
