//! Test doubles for [`KvBackend`].
//!
//! `RecordingBackend` wraps an [`InMemoryBackend`], records every call with its expiry, yields to
//! the scheduler inside `get` so concurrent read-modify-writes get a chance to interleave, and can
//! be switched to fail every call.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use context_core::{ContextError, InMemoryBackend, KvBackend, Result};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Set(String, Option<Duration>),
    Delete(String),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    inner: InMemoryBackend,
    calls: Arc<Mutex<Vec<Call>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryBackend {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw string stored at `key`, bypassing the call log.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .await
            .unwrap()
            .map(|v| String::from_utf8(v).unwrap())
    }

    /// Stores `value` at `key`, bypassing the call log.
    pub async fn put_raw(&self, key: &str, value: &[u8]) {
        self.inner.set(key, value.to_vec(), None).await.unwrap();
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContextError::Backend("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KvBackend for RecordingBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.record(Call::Get(key.to_string()))?;
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiry: Option<Duration>) -> Result<()> {
        self.record(Call::Set(key.to_string(), expiry))?;
        self.inner.set(key, value, expiry).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.record(Call::Delete(key.to_string()))?;
        self.inner.delete(key).await
    }
}
