//! # context-redis
//!
//! [`KvBackend`] over a Redis server. Values are written with `SET` (plus `PX` when an expiry is
//! configured), read with `GET` and removed with `DEL`. Connection errors are returned to the
//! caller unchanged in meaning; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use context_core::{ContextError, KvBackend, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Redis-backed [`KvBackend`]. The multiplexed connection is opened on first use and shared by
/// every call afterwards.
pub struct RedisBackend {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisBackend {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            connection: OnceCell::new(),
        }
    }

    /// Creates a backend for `url` (e.g. `redis://127.0.0.1:6379/0`). Does not connect yet.
    pub fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(backend_error)?;
        Ok(Self::new(client))
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                let conn = self
                    .client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(backend_error)?;
                info!(
                    addr = %self.client.get_connection_info().addr,
                    "Connected to Redis context backend"
                );
                Ok::<_, ContextError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

/// Largest `PX` value Redis accepts.
const MAX_PX_MILLIS: u64 = i64::MAX as u64;

/// `SET` arguments for the expiry: none, or `PX` with whole milliseconds in `1..=i64::MAX`.
fn expiry_millis(expiry: Option<Duration>) -> Option<u64> {
    expiry.filter(|d| !d.is_zero()).map(|d| {
        u64::try_from(d.as_millis())
            .unwrap_or(MAX_PX_MILLIS)
            .clamp(1, MAX_PX_MILLIS)
    })
}

fn backend_error(e: redis::RedisError) -> ContextError {
    ContextError::Backend(e.to_string())
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(backend_error)?;
        debug!(key = %key, found = value.is_some(), "step: redis GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiry: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        let px = expiry_millis(expiry);
        if let Some(ms) = px {
            cmd.arg("PX").arg(ms);
        }
        let _: () = cmd.query_async(&mut conn).await.map_err(backend_error)?;
        debug!(key = %key, px = ?px, "step: redis SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await.map_err(backend_error)?;
        debug!(key = %key, removed, "step: redis DEL");
        Ok(())
    }
}
