//! In-memory implementation of the KvBackend trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::backend::KvBackend;
use crate::error::Result;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

type EntryMap = HashMap<String, Entry>;

/// Process-local backend. Clones share the same map, so one instance can stand in for a
/// remote store shared by several contexts. Expired keys are dropped when read.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    entries: Arc<RwLock<EntryMap>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.get(key).map(|e| !e.is_expired(now)).unwrap_or(false)
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}

#[async_trait]
impl KvBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).map(|e| e.is_expired(now)).unwrap_or(false) {
            entries.remove(key);
            debug!(key = %key, "step: in-memory backend dropped expired key");
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiry: Option<Duration>) -> Result<()> {
        let expires_at = expiry
            .filter(|d| !d.is_zero())
            .map(|d| Instant::now() + d);
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
