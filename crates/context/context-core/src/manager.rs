//! Hands out one shared [`MemoryContext`] per (chat, user) pair.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::backend::KvBackend;
use crate::config::ContextConfig;
use crate::context::MemoryContext;
use crate::inmemory::InMemoryBackend;
use crate::state::StateRegistry;
use crate::types::ContextKey;

/// Lookup of contexts by key. All contexts share the backend, config and registry, but each has
/// its own lock, so unrelated conversations never wait on each other.
pub struct ContextManager {
    backend: Arc<dyn KvBackend>,
    config: ContextConfig,
    registry: Arc<StateRegistry>,
    contexts: Mutex<HashMap<ContextKey, Arc<MemoryContext>>>,
}

impl ContextManager {
    pub fn new(backend: Arc<dyn KvBackend>, config: ContextConfig) -> Self {
        Self {
            backend,
            config,
            registry: StateRegistry::global(),
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Manager whose contexts live in one process-local backend, without expiry.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()), ContextConfig::default())
    }

    pub fn with_registry(mut self, registry: Arc<StateRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Existing context for the pair, or a new one.
    pub fn get(&self, chat_id: Option<i64>, user_id: Option<i64>) -> Arc<MemoryContext> {
        let key = ContextKey::new(chat_id, user_id);
        let mut contexts = self.contexts.lock();
        contexts
            .entry(key)
            .or_insert_with(|| {
                debug!(chat_id = ?chat_id, user_id = ?user_id, "step: creating memory context");
                Arc::new(
                    MemoryContext::with_backend(
                        chat_id,
                        user_id,
                        self.backend.clone(),
                        self.config.clone(),
                    )
                    .with_registry(self.registry.clone()),
                )
            })
            .clone()
    }

    /// Forgets the instance for the pair. Stored data and state are left untouched.
    pub fn remove(&self, chat_id: Option<i64>, user_id: Option<i64>) -> Option<Arc<MemoryContext>> {
        self.contexts
            .lock()
            .remove(&ContextKey::new(chat_id, user_id))
    }

    pub fn len(&self) -> usize {
        self.contexts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
