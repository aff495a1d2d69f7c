use anyhow::{bail, Context, Result};
use futures::future::join_all;
use hashstore_core::{
    is_hash, CallbackCodec, HashStorage, Resolution, StorageConfig, CALLBACK_DATA_LIMIT,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Context a bot would attach to an inline button
#[derive(Debug, Clone, PartialEq)]
struct ButtonContext {
    chat_id: i64,
    action: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hashstore_scenarios=info,hashstore_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StorageConfig::from_env().context("reading hash storage config")?;

    tracing::info!("🧪 Hash storage scenarios");
    tracing::info!("   TTL: {:?}, cleanup interval: {:?}", config.ttl, config.cleanup_interval);
    println!();

    // One storage per value type, owned here and handed to each scenario
    let queries: HashStorage<String> = HashStorage::with_config(config.clone())?;
    let buttons: HashStorage<ButtonContext> = HashStorage::with_config(config)?;

    test_basic_operations(&queries)?;
    test_callback_round_trip(CallbackCodec::new(buttons.clone()))?;
    test_long_query_hashing(CallbackCodec::new(queries.clone()))?;
    test_parallel_put_get(&queries).await?;
    test_expiration().await?;

    queries.shutdown();
    buttons.shutdown();

    println!();
    tracing::info!("✅ All scenarios passed!");

    Ok(())
}

/// PUT/GET/DELETE on a single key
fn test_basic_operations(storage: &HashStorage<String>) -> Result<()> {
    tracing::info!("Scenario: Basic Operations");

    let key = format!("basic-{}", uuid::Uuid::new_v4().simple());
    storage.put(key.clone(), "hello world".to_string())?;
    tracing::info!("   PUT {}", key);

    let value = storage.get(&key);
    tracing::info!("   GET {} → {:?}", key, value);
    if value.as_deref() != Some("hello world") {
        bail!("expected stored value, got {:?}", value);
    }

    let deleted = storage.delete(&key);
    tracing::info!("   DELETE {} → {}", key, deleted);
    if storage.get(&key).is_some() {
        bail!("key {} still readable after delete", key);
    }

    // Deleting twice is fine
    storage.delete(&key);

    tracing::info!("   ✓ Basic operations work correctly");
    Ok(())
}

/// Issue a button, tap it, then tap a one-shot button twice
fn test_callback_round_trip(codec: CallbackCodec<ButtonContext>) -> Result<()> {
    tracing::info!("Scenario: Callback Round Trip");

    let context = ButtonContext {
        chat_id: 123_456_789,
        action: "open_web_app".to_string(),
    };
    let data = codec.issue(context.clone())?;
    tracing::info!("   Issued callback data {} ({} bytes)", data, data.len());

    match codec.resolve(&data) {
        Resolution::Resolved(found) if found == context => {}
        other => bail!("unexpected resolution {:?}", other),
    }

    let confirm = codec.issue(ButtonContext {
        chat_id: context.chat_id,
        action: "confirm_reset".to_string(),
    })?;
    if codec.consume(&confirm).into_context().is_none() {
        bail!("first tap on one-shot button was not resolved");
    }
    let second = codec.consume(&confirm);
    match second.reply_text() {
        Some(reply) => tracing::info!("   Second tap answered with: {}", reply),
        None => bail!("second tap on one-shot button should have expired"),
    }

    if codec.resolve("not-ours") != Resolution::Unrecognized {
        bail!("foreign payload should be unrecognized");
    }

    tracing::info!("   ✓ Callbacks resolve and degrade gracefully");
    Ok(())
}

/// Queries over the callback limit travel as content hashes
fn test_long_query_hashing(codec: CallbackCodec<String>) -> Result<()> {
    tracing::info!("Scenario: Long Query Hashing");

    let query = format!("client_get_usage {}", "some.long.email@example.com ".repeat(3));
    let data = codec.encode_query(&query)?;
    tracing::info!("   {} byte query → {}", query.len(), data);

    if !is_hash(&data) || data.len() > CALLBACK_DATA_LIMIT {
        bail!("long query was not hashed: {}", data);
    }
    if codec.decode_query(&data) != Resolution::Resolved(query) {
        bail!("hash {} did not decode to the original query", data);
    }

    tracing::info!("   ✓ Long queries survive the 64-byte limit");
    Ok(())
}

/// Parallel PUT and GET from many tasks - verify no data mixing
async fn test_parallel_put_get(storage: &HashStorage<String>) -> Result<()> {
    let num_operations = 500;
    tracing::info!("Scenario: Parallel PUT/GET ({} concurrent operations)", num_operations);

    let test_data: Vec<(String, String)> = (0..num_operations)
        .map(|i| {
            let key = format!("parallel-{}-{}", i, uuid::Uuid::new_v4().simple());
            let value = format!("value-{}-{}", i, uuid::Uuid::new_v4());
            (key, value)
        })
        .collect();

    let start = Instant::now();
    let put_tasks: Vec<_> = test_data
        .iter()
        .cloned()
        .map(|(key, value)| {
            let storage = storage.clone();
            tokio::spawn(async move { storage.put(key, value) })
        })
        .collect();

    for result in join_all(put_tasks).await {
        result??;
    }
    let put_elapsed = start.elapsed();

    let get_start = Instant::now();
    let errors = Arc::new(AtomicUsize::new(0));
    let get_tasks: Vec<_> = test_data
        .iter()
        .cloned()
        .map(|(key, expected_value)| {
            let storage = storage.clone();
            let errors = Arc::clone(&errors);
            tokio::spawn(async move {
                let value = storage.get(&key);
                if value.as_deref() != Some(expected_value.as_str()) {
                    tracing::error!(
                        "Value mismatch for key {}: expected '{}', got '{:?}'",
                        key,
                        expected_value,
                        value
                    );
                    errors.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for result in join_all(get_tasks).await {
        result?;
    }
    let get_elapsed = get_start.elapsed();

    tracing::info!("   PUT {} keys in {:?}", num_operations, put_elapsed);
    tracing::info!("   GET {} keys in {:?}", num_operations, get_elapsed);

    let error_count = errors.load(Ordering::SeqCst);
    if error_count > 0 {
        bail!("{} values mismatched", error_count);
    }

    for (key, _) in &test_data {
        storage.delete(key);
    }

    tracing::info!("   ✓ All {} values verified correctly", num_operations);
    Ok(())
}

/// Short-lived storage: entries vanish after the TTL and the sweep reclaims them
async fn test_expiration() -> Result<()> {
    tracing::info!("Scenario: TTL Expiration");

    let config = StorageConfig::new(Duration::from_millis(500))
        .with_cleanup_interval(Duration::from_millis(100));
    let storage: HashStorage<String> = HashStorage::with_config(config)?;

    storage.put("read-later", "temporary".to_string())?;
    storage.put("never-read", "temporary".to_string())?;

    if storage.get("read-later").is_none() {
        bail!("key should exist immediately");
    }

    tracing::info!("   Waiting 1 second for expiration...");
    tokio::time::sleep(Duration::from_secs(1)).await;

    if storage.get("read-later").is_some() {
        bail!("key should be expired after TTL");
    }
    if !storage.is_empty() {
        bail!("sweep left {} expired entries behind", storage.len());
    }

    storage.shutdown();
    tracing::info!("   ✓ TTL expiration works correctly");
    Ok(())
}
