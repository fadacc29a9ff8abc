//! Behavioural properties of the cache backend against the in-memory store.

#![cfg(feature = "inmemory")]

use proptest::prelude::*;
use redis_cache_adapter::codec::{BinaryCodec, JsonCodec};
use redis_cache_adapter::store::InMemoryServer;
use redis_cache_adapter::{AdapterConfig, AdapterOptions, CacheBackend, Error, Numeric, Payload};
use serde::{Deserialize, Serialize};
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn backend(server: &InMemoryServer, config: AdapterConfig) -> CacheBackend<InMemoryServer, JsonCodec> {
    CacheBackend::new(server.clone(), JsonCodec::new(), config)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Session {
    user_id: u64,
    roles: Vec<String>,
}

#[tokio::test]
async fn round_trip_value_through_codec() {
    init_logging();
    let server = InMemoryServer::new();
    let mut cache = CacheBackend::new(
        server.clone(),
        BinaryCodec::<Session>::new(),
        AdapterConfig::default(),
    );

    let session = Session {
        user_id: 7,
        roles: vec!["admin".to_string()],
    };
    cache
        .save()
        .key("session:7")
        .value(session.clone())
        .execute()
        .await
        .expect("Failed to save");

    assert_eq!(
        cache.get("session:7").await.expect("Failed to get"),
        Some(Payload::Value(session))
    );
}

#[tokio::test]
async fn round_trip_number_bypasses_codec() {
    init_logging();
    let server = InMemoryServer::new();
    let mut cache = CacheBackend::new(
        server.clone(),
        BinaryCodec::<Session>::new(),
        AdapterConfig::default(),
    );

    cache
        .save()
        .key("n")
        .number(-12)
        .execute()
        .await
        .expect("Failed to save");

    // the binary codec would reject these bytes
    assert_eq!(
        cache.get("n").await.expect("Failed to get"),
        Some(Payload::Number(Numeric::Int(-12)))
    );
}

#[tokio::test]
async fn explicit_ttl_overrides_session_and_codec() {
    let server = InMemoryServer::new();
    let mut cache = CacheBackend::new(
        server.clone(),
        JsonCodec::new().with_lifetime(600),
        AdapterConfig::default(),
    );

    cache.start("warm", Some(90)).await.expect("Failed to start");
    cache
        .save()
        .key("k")
        .value(json!("v"))
        .ttl(5)
        .execute()
        .await
        .expect("Failed to save");

    assert_eq!(server.ttl(0, "k").await, 5);
}

#[tokio::test]
async fn tracking_follows_save_and_delete() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default().with_prefix("site1:"));

    cache
        .save()
        .key("user:1")
        .value(json!({"id": 1}))
        .execute()
        .await
        .expect("Failed to save");
    let keys = cache.query_keys(None).await.expect("Failed to query");
    assert!(keys.contains(&"site1:user:1".to_string()));

    cache.delete("user:1").await.expect("Failed to delete");
    let keys = cache.query_keys(None).await.expect("Failed to query");
    assert!(!keys.contains(&"site1:user:1".to_string()));
}

#[tokio::test]
async fn prefix_filter_matches_start_of_tracked_key() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default());

    for key in ["user:1", "user:2", "post:1", "xuser:3"] {
        cache
            .save()
            .key(key)
            .value(json!(key))
            .execute()
            .await
            .expect("Failed to save");
    }

    let mut users = cache.query_keys(Some("user:")).await.expect("Failed to query");
    users.sort();
    assert_eq!(users, vec!["user:1", "user:2"]);
}

#[tokio::test]
async fn flush_clears_every_tracked_key() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default().with_index(3));

    for i in 0..20 {
        cache
            .save()
            .key(format!("item:{}", i))
            .value(json!({"n": i}))
            .execute()
            .await
            .expect("Failed to save");
    }

    assert!(cache.flush().await.expect("Failed to flush"));
    assert!(cache.query_keys(None).await.expect("Failed to query").is_empty());
    assert!(server.is_empty(3).await);
}

#[tokio::test]
async fn flush_leaves_untracked_keys_alone() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default());

    // counters are written by INCRBY and never tracked
    cache.increment(Some("hits"), 1).await.expect("Failed to incr");
    cache
        .save()
        .key("doc")
        .value(json!("x"))
        .execute()
        .await
        .expect("Failed to save");

    cache.flush().await.expect("Failed to flush");
    assert!(cache.exists(Some("hits")).await.expect("Failed to check exists"));
    assert!(!cache.exists(Some("doc")).await.expect("Failed to check exists"));
}

#[tokio::test]
async fn disabled_tracking_rejects_enumeration() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default().with_stats_key(""));

    assert_eq!(cache.query_keys(None).await, Err(Error::TrackingDisabledError));
    assert_eq!(cache.flush().await, Err(Error::TrackingDisabledError));
}

#[tokio::test]
async fn no_active_key_behaviour() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default());

    assert!(!cache.exists(None).await.expect("Failed to check exists"));
    assert_eq!(
        cache.save().value(json!(1)).execute().await,
        Err(Error::NoActiveKeyError)
    );
}

#[tokio::test]
async fn counter_semantics() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default());

    assert_eq!(cache.increment(Some("c"), 3).await.expect("Failed to incr"), 3);
    assert_eq!(cache.decrement(Some("c"), 1).await.expect("Failed to decr"), 2);
}

#[tokio::test]
async fn counter_on_encoded_value_is_an_error() {
    let server = InMemoryServer::new();
    let mut cache = backend(&server, AdapterConfig::default());

    cache
        .save()
        .key("doc")
        .value(json!({"a": 1}))
        .execute()
        .await
        .expect("Failed to save");
    assert!(cache.increment(Some("doc"), 1).await.is_err());
}

#[tokio::test]
async fn options_drive_connection_handshake() {
    let server = InMemoryServer::new().with_password("pw");
    let options: AdapterOptions = serde_json::from_value(json!({
        "auth": "pw",
        "index": 2,
        "statsKey": "_IDX",
        "prefix": "p:"
    }))
    .expect("Failed to parse options");
    let config = AdapterConfig::from_options(options).expect("Failed to build config");

    let mut cache = backend(&server, config);
    cache
        .save()
        .key("k")
        .number(1)
        .execute()
        .await
        .expect("Failed to save");

    assert_eq!(server.raw(2, "p:k").await, Some(b"1".to_vec()));
    assert_eq!(cache.query_keys(None).await.expect("Failed to query"), vec!["p:k"]);
}

#[tokio::test]
async fn wrong_secret_is_auth_error() {
    let server = InMemoryServer::new().with_password("pw");
    let mut cache = backend(&server, AdapterConfig::default().with_auth("nope"));

    match cache.get("k").await {
        Err(Error::AuthError(_)) => {}
        other => panic!("Expected AuthError, got {:?}", other),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn json_round_trip_preserves_non_numeric_strings(text in "[a-zA-Z ]{0,24}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        runtime.block_on(async {
            let server = InMemoryServer::new();
            let mut cache = backend(&server, AdapterConfig::default());

            cache
                .save()
                .key("prop")
                .value(json!(text.clone()))
                .execute()
                .await
                .expect("Failed to save");
            let read = cache.get("prop").await.expect("Failed to get");
            assert_eq!(read, Some(Payload::Value(json!(text))));
        });
    }

    #[test]
    fn integer_round_trip_is_exact(n in any::<i64>()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        runtime.block_on(async {
            let server = InMemoryServer::new();
            let mut cache = backend(&server, AdapterConfig::default());

            cache
                .save()
                .key("n")
                .number(n)
                .execute()
                .await
                .expect("Failed to save");
            let read = cache.get("n").await.expect("Failed to get");
            assert_eq!(read, Some(Payload::Number(Numeric::Int(n))));
        });
    }

    #[test]
    fn finite_float_round_trip_is_exact(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        runtime.block_on(async {
            let server = InMemoryServer::new();
            let mut cache = backend(&server, AdapterConfig::default());

            cache
                .save()
                .key("x")
                .number(x)
                .execute()
                .await
                .expect("Failed to save");
            let read = cache.get("x").await.expect("Failed to get");
            assert_eq!(read, Some(Payload::Number(Numeric::Float(x))));
        });
    }
}
