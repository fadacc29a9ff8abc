//! # redis-cache-adapter
//!
//! A Redis-backed cache adapter with key namespacing, lazy connection handling
//! and a tracked key index for enumeration and bulk invalidation.
//!
//! ## Features
//!
//! - **Lazy connection:** connect, `AUTH` and `SELECT` happen on first use, never retried behind your back
//! - **Key namespacing:** every key is prefixed; the last key is remembered for follow-up calls
//! - **Key tracking:** written keys are recorded in a stats set so they can be listed and flushed
//! - **Native numbers:** numeric content is stored verbatim and works with `INCRBY`/`DECRBY`
//! - **Pluggable codecs:** JSON, postcard binary, raw bytes, or captured output
//! - **Backend agnostic:** Redis in production, an in-memory store for tests
//!
//! ## Quick Start
//!
//! ```ignore
//! use redis_cache_adapter::{AdapterConfig, CacheBackend};
//! use redis_cache_adapter::codec::JsonCodec;
//! use redis_cache_adapter::store::RedisConnector;
//!
//! let config = AdapterConfig::from_env()?.with_prefix("app:");
//! let mut cache = CacheBackend::new(RedisConnector::new(), JsonCodec::new(), config);
//!
//! cache.save().key("user:1").value(json!({"name": "ada"})).ttl(300).execute().await?;
//! let user = cache.get("user:1").await?;
//!
//! cache.increment(Some("visits"), 1).await?;
//! let tracked = cache.query_keys(Some("app:user:")).await?;
//! cache.flush().await?;
//! ```

#[macro_use]
extern crate log;

pub mod adapter;
pub mod builder;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod key;
pub mod observability;
pub mod payload;
pub mod stats;
pub mod store;
pub mod ttl;

// Re-exports for convenience
pub use adapter::CacheBackend;
pub use builder::SaveOperation;
pub use codec::ContentCodec;
pub use config::{AdapterConfig, AdapterOptions};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{Error, Result};
pub use key::KeyNamespace;
pub use observability::CacheMetrics;
pub use payload::{Numeric, Payload};
pub use stats::{KeyIndex, StatsSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
