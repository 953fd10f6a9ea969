//! Integration tests against a live Redis. Skipped unless REDIS_URL is set.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use context_core::{ContextConfig, KeyKind, KvBackend, MemoryContext, StateRegistry, StatesGroup};
use context_redis::RedisBackend;
use serde_json::json;

fn backend() -> Option<RedisBackend> {
    let url = match std::env::var("REDIS_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping: REDIS_URL not set");
            return None;
        }
    };
    Some(RedisBackend::connect(&url).expect("valid REDIS_URL"))
}

/// Prefix unique to one test run so parallel tests and reruns never share keys.
fn unique_prefix(test: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("context-redis-test:{}:{}:{}", test, std::process::id(), nanos)
}

#[tokio::test]
async fn raw_get_set_delete() {
    let Some(backend) = backend() else { return };
    let key = format!("{}:raw", unique_prefix("raw"));

    assert!(backend.get(&key).await.unwrap().is_none());
    backend.set(&key, b"hello".to_vec(), None).await.unwrap();
    assert_eq!(backend.get(&key).await.unwrap(), Some(b"hello".to_vec()));
    backend.delete(&key).await.unwrap();
    assert!(backend.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn expiry_is_applied() {
    let Some(backend) = backend() else { return };
    let key = format!("{}:ttl", unique_prefix("ttl"));

    backend
        .set(&key, b"x".to_vec(), Some(Duration::from_millis(200)))
        .await
        .unwrap();
    assert!(backend.get(&key).await.unwrap().is_some());
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(backend.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_context_round_trip() {
    let Some(backend) = backend() else { return };
    let backend = Arc::new(backend);
    let registry = Arc::new(StateRegistry::new());
    let group = registry
        .register(StatesGroup::new("Signup").with_state("email").with_state("code"))
        .unwrap();

    let ctx = MemoryContext::with_backend(
        Some(-100123),
        Some(42),
        backend.clone(),
        ContextConfig::new(unique_prefix("ctx"), Some(Duration::from_secs(60))),
    )
    .with_registry(registry);

    ctx.update_data([("email", json!("a@b.c"))]).await.unwrap();
    ctx.update_data([("attempts", json!(1))]).await.unwrap();
    ctx.set_state(Some(group.state("code").unwrap().into()))
        .await
        .unwrap();

    let data = ctx.get_data().await.unwrap();
    assert_eq!(data["email"], json!("a@b.c"));
    assert_eq!(data["attempts"], json!(1));
    assert_eq!(
        ctx.get_state().await.unwrap().and_then(|s| s.as_state().cloned()).as_ref(),
        group.state("code")
    );

    ctx.clear().await.unwrap();
    assert!(backend.get(&ctx.storage_key(KeyKind::Data)).await.unwrap().is_none());
    assert!(backend.get(&ctx.storage_key(KeyKind::State)).await.unwrap().is_none());
}
