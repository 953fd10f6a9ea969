//! Core types: context identity, storage key kinds and the data blob.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Arbitrary per-conversation data. Always a mapping, never null.
pub type DataBlob = Map<String, Value>;

/// Identity of one context: (chat, user). Either side may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub chat_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// What a storage key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Data,
    State,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Data => "data",
            KeyKind::State => "state",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContextKey {
    pub fn new(chat_id: Option<i64>, user_id: Option<i64>) -> Self {
        Self { chat_id, user_id }
    }

    /// Storage key `{prefix}:{kind}:{chat}:{user}`, absent ids rendered as `none`.
    /// Layout is shared with already persisted data and must not change.
    pub fn storage_key(&self, prefix: &str, kind: KeyKind) -> String {
        format!(
            "{}:{}:{}:{}",
            prefix,
            kind,
            id_or_none(self.chat_id),
            id_or_none(self.user_id)
        )
    }
}

fn id_or_none(id: Option<i64>) -> String {
    id.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
}

/// Converts a value to JSON, falling back to its string form when it has no JSON representation
/// (e.g. a map keyed by non-string values).
pub fn json_or_string<T>(value: &T) -> Value
where
    T: Serialize + fmt::Display + ?Sized,
{
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(value.to_string()))
}
