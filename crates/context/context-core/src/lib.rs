//! # context-core
//!
//! Per-(chat, user) dialogue context for bots: an arbitrary JSON data blob plus the current FSM
//! state, persisted through a [`KvBackend`] (in-process by default, a remote store such as Redis
//! otherwise). State names are restored against a [`StateRegistry`] of declared [`StatesGroup`]s.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod inmemory;
pub mod manager;
pub mod state;
pub mod types;

pub use backend::KvBackend;
pub use config::{ContextConfig, DEFAULT_PREFIX};
pub use context::MemoryContext;
pub use error::{ContextError, Result};
pub use inmemory::InMemoryBackend;
pub use manager::ContextManager;
pub use state::{State, StateRegistry, StateValue, StatesGroup};
pub use types::{json_or_string, ContextKey, DataBlob, KeyKind};
