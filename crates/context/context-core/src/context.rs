//! # Memory context
//!
//! [`MemoryContext`] holds the data blob and FSM state of one (chat, user) pair. Every operation
//! takes the instance lock for its whole duration, backend round-trips included, so operations on
//! one instance never interleave. Nothing is shared between instances: two contexts pointing at
//! the same backend keys race with last-writer-wins.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::backend::KvBackend;
use crate::config::ContextConfig;
use crate::error::Result;
use crate::inmemory::InMemoryBackend;
use crate::state::{StateRegistry, StateValue};
use crate::types::{json_or_string, ContextKey, DataBlob, KeyKind};

/// Last values read or written. The backend stays the source of truth.
#[derive(Debug, Default)]
struct Cached {
    data: DataBlob,
    state: Option<StateValue>,
}

/// Per-(chat, user) context: data blob plus current dialogue state.
pub struct MemoryContext {
    key: ContextKey,
    backend: Arc<dyn KvBackend>,
    config: ContextConfig,
    registry: Arc<StateRegistry>,
    cached: Mutex<Cached>,
}

impl fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContext")
            .field("key", &self.key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MemoryContext {
    /// Local mode: a private in-process backend, no expiry.
    pub fn new(chat_id: Option<i64>, user_id: Option<i64>) -> Self {
        Self::with_backend(
            chat_id,
            user_id,
            Arc::new(InMemoryBackend::new()),
            ContextConfig::default(),
        )
    }

    /// Context persisted through `backend` under `config.prefix`, every write expiring after `config.ttl`.
    pub fn with_backend(
        chat_id: Option<i64>,
        user_id: Option<i64>,
        backend: Arc<dyn KvBackend>,
        config: ContextConfig,
    ) -> Self {
        let config = ContextConfig::new(&config.prefix, config.ttl);
        Self {
            key: ContextKey::new(chat_id, user_id),
            backend,
            config,
            registry: StateRegistry::global(),
            cached: Mutex::new(Cached::default()),
        }
    }

    /// Uses `registry` instead of the process-wide one to restore stored state names.
    pub fn with_registry(mut self, registry: Arc<StateRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn key(&self) -> ContextKey {
        self.key
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.key.chat_id
    }

    pub fn user_id(&self) -> Option<i64> {
        self.key.user_id
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn storage_key(&self, kind: KeyKind) -> String {
        self.key.storage_key(&self.config.prefix, kind)
    }

    /// Current data. Missing or malformed stored data reads as an empty mapping.
    pub async fn get_data(&self) -> Result<DataBlob> {
        let mut cached = self.cached.lock().await;
        let data = self.read_data().await?;
        cached.data = data.clone();
        Ok(data)
    }

    /// Replaces the data wholesale.
    pub async fn set_data(&self, data: DataBlob) -> Result<()> {
        let mut cached = self.cached.lock().await;
        self.write_data(&data).await?;
        cached.data = data;
        Ok(())
    }

    /// Shallow merge of `values` into the stored data; new values win. Returns the merged data.
    ///
    /// The read-modify-write is atomic only with respect to this instance.
    #[instrument(skip_all, fields(chat_id = ?self.key.chat_id, user_id = ?self.key.user_id))]
    pub async fn update_data<I, K>(&self, values: I) -> Result<DataBlob>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let values: Vec<(String, Value)> =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut cached = self.cached.lock().await;
        let mut current = self.read_data().await?;
        debug!(
            updated_keys = values.len(),
            existing_keys = current.len(),
            "step: merging context data"
        );
        current.extend(values);
        self.write_data(&current).await?;
        cached.data = current.clone();
        Ok(current)
    }

    /// Sets a single data key. Values without a JSON form are stored as their string form.
    pub async fn update_value<T>(&self, key: impl Into<String>, value: &T) -> Result<DataBlob>
    where
        T: Serialize + fmt::Display + ?Sized,
    {
        let value = json_or_string(value);
        self.update_data([(key.into(), value)]).await
    }

    /// Sets the state, or removes it with `None`. Returns the state as it will be read back:
    /// names matching a declared state come back as that state, others as detached states.
    /// This holds in every mode: a [`StateValue::Raw`] input is never handed back as `Raw`, so
    /// compare states by [`StateValue::name`] rather than against the value passed in.
    pub async fn set_state(&self, state: Option<StateValue>) -> Result<Option<StateValue>> {
        let mut cached = self.cached.lock().await;
        let key = self.storage_key(KeyKind::State);
        let serialized = state.as_ref().map(|s| s.name().to_string());

        match &serialized {
            None => {
                debug!(key = %key, "step: removing context state");
                self.backend.delete(&key).await?;
            }
            Some(name) => {
                debug!(key = %key, state = %name, "step: writing context state");
                self.backend
                    .set(&key, name.clone().into_bytes(), self.config.ttl)
                    .await?;
            }
        }

        let restored = self.registry.restore(serialized.as_deref());
        cached.state = restored.clone();
        Ok(restored)
    }

    /// Current state, `None` if no state is stored.
    pub async fn get_state(&self) -> Result<Option<StateValue>> {
        let mut cached = self.cached.lock().await;
        let key = self.storage_key(KeyKind::State);

        let restored = match self.backend.get(&key).await? {
            None => None,
            Some(raw) => {
                let name = String::from_utf8_lossy(&raw);
                self.registry.restore(Some(&*name))
            }
        };
        cached.state = restored.clone();
        Ok(restored)
    }

    /// Drops data and state, locally and in the backend. The two deletes are not atomic.
    pub async fn clear(&self) -> Result<()> {
        let mut cached = self.cached.lock().await;
        *cached = Cached::default();

        let data_key = self.storage_key(KeyKind::Data);
        let state_key = self.storage_key(KeyKind::State);
        debug!(data_key = %data_key, state_key = %state_key, "step: clearing context");
        self.backend.delete(&data_key).await?;
        self.backend.delete(&state_key).await?;
        Ok(())
    }

    /// Data from the last read or write, without touching the backend.
    pub async fn cached_data(&self) -> DataBlob {
        self.cached.lock().await.data.clone()
    }

    /// State from the last read or write, without touching the backend.
    pub async fn cached_state(&self) -> Option<StateValue> {
        self.cached.lock().await.state.clone()
    }

    async fn read_data(&self) -> Result<DataBlob> {
        let key = self.storage_key(KeyKind::Data);
        let data = match self.backend.get(&key).await? {
            None => DataBlob::new(),
            Some(raw) => parse_data(&key, &raw),
        };
        Ok(data)
    }

    async fn write_data(&self, data: &DataBlob) -> Result<()> {
        let key = self.storage_key(KeyKind::Data);
        let raw = serde_json::to_vec(data)?;
        debug!(key = %key, bytes = raw.len(), "step: writing context data");
        self.backend.set(&key, raw, self.config.ttl).await
    }
}

fn parse_data(key: &str, raw: &[u8]) -> DataBlob {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(key = %key, kind = json_kind(&other), "Stored context data is not an object, using empty data");
            DataBlob::new()
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Stored context data is not valid JSON, using empty data");
            DataBlob::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
