//! End-to-end flow against a live Redis server.
//!
//! Run with `REDIS_HOST`/`REDIS_PORT` pointing at a disposable server:
//! `cargo test --features redis -- --ignored`

#![cfg(feature = "redis")]

use redis_cache_adapter::codec::JsonCodec;
use redis_cache_adapter::store::RedisConnector;
use redis_cache_adapter::{AdapterConfig, CacheBackend, ConnectionState, Numeric, Payload};
use serde_json::json;

fn config(prefix: &str) -> AdapterConfig {
    AdapterConfig::from_env()
        .expect("Failed to read config")
        .with_prefix(prefix)
        .with_stats_key(format!("{}_stats", prefix))
}

#[tokio::test]
#[ignore]
async fn full_flow_against_redis() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut cache = CacheBackend::new(
        RedisConnector::new(),
        JsonCodec::new(),
        config("rca-it:"),
    );
    cache.connect().await.expect("Failed to connect");
    assert_eq!(cache.connection_state(), ConnectionState::DbSelected);

    cache.flush().await.expect("Failed to flush");

    cache
        .save()
        .key("user:1")
        .value(json!({"name": "ada"}))
        .ttl(30)
        .execute()
        .await
        .expect("Failed to save");
    assert_eq!(
        cache.get("user:1").await.expect("Failed to get"),
        Some(Payload::Value(json!({"name": "ada"})))
    );

    assert_eq!(cache.increment(Some("hits"), 3).await.expect("Failed to incr"), 3);
    assert_eq!(cache.decrement(None, 1).await.expect("Failed to decr"), 2);
    assert_eq!(
        cache.get("hits").await.expect("Failed to get"),
        Some(Payload::Number(Numeric::Int(2)))
    );

    assert_eq!(
        cache.query_keys(Some("rca-it:user:")).await.expect("Failed to query"),
        vec!["rca-it:user:1"]
    );

    assert!(cache.delete("user:1").await.expect("Failed to delete"));
    assert!(cache.delete("hits").await.expect("Failed to delete"));
    assert!(cache.flush().await.expect("Failed to flush"));
    assert!(cache.query_keys(None).await.expect("Failed to query").is_empty());
}

#[tokio::test]
#[ignore]
async fn persistent_connection_flow() {
    let mut cache = CacheBackend::new(
        RedisConnector::new(),
        JsonCodec::new(),
        config("rca-it-p:").with_persistent(true),
    );

    cache
        .save()
        .key("k")
        .number(1.5)
        .ttl(10)
        .execute()
        .await
        .expect("Failed to save");
    assert!(cache.exists(None).await.expect("Failed to check exists"));
    assert!(cache.flush().await.expect("Failed to flush"));
}

#[tokio::test]
#[ignore]
async fn severed_connection_fails_instead_of_reconnecting() {
    let config = config("rca-it-sev:").with_persistent(true).with_index(3);
    let mut cache = CacheBackend::new(RedisConnector::new(), JsonCodec::new(), config.clone());
    cache
        .save()
        .key("before")
        .number(1)
        .execute()
        .await
        .expect("Failed to save");

    let client = redis::Client::open(format!("redis://{}:{}/", config.host, config.port))
        .expect("Failed to build admin client");
    let mut admin = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect admin");
    if let Some(secret) = &config.auth_secret {
        redis::cmd("AUTH")
            .arg(secret)
            .query_async::<()>(&mut admin)
            .await
            .expect("Failed to auth admin");
    }
    // drop every other client, including the adapter's connection
    let _: u64 = redis::cmd("CLIENT")
        .arg("KILL")
        .arg("TYPE")
        .arg("normal")
        .arg("SKIPME")
        .arg("yes")
        .query_async(&mut admin)
        .await
        .expect("Failed to kill clients");
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(cache.save().key("after").number(2).execute().await.is_err());

    // a silent reconnect would have written to db 0
    let landed: bool = redis::cmd("EXISTS")
        .arg("rca-it-sev:after")
        .query_async(&mut admin)
        .await
        .expect("Failed to check db 0");
    assert!(!landed);

    let _: () = redis::cmd("SELECT")
        .arg(3)
        .query_async(&mut admin)
        .await
        .expect("Failed to select");
    let _: u64 = redis::cmd("DEL")
        .arg("rca-it-sev:before")
        .arg("rca-it-sev:_stats")
        .query_async(&mut admin)
        .await
        .expect("Failed to clean up");
}
