//! Key-value backend trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Byte-oriented key-value storage with optional per-write expiry.
///
/// [`crate::MemoryContext`] persists everything through this trait: the in-process
/// [`crate::InMemoryBackend`] for local mode, a remote store (e.g. Redis) otherwise.
/// Failures are returned as-is; implementations do not retry.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Raw value at `key`, `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Overwrites `key`. A zero or absent `expiry` means the key does not expire.
    async fn set(&self, key: &str, value: Vec<u8>, expiry: Option<Duration>) -> Result<()>;
    /// Removes `key`; deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
