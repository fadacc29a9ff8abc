//! Basic usage example of the cache adapter.
//!
//! Runs against the in-memory store; swap in `RedisConnector` (feature `redis`)
//! to talk to a real server.

use redis_cache_adapter::codec::{BinaryCodec, OutputCodec};
use redis_cache_adapter::observability::LogMetrics;
use redis_cache_adapter::store::InMemoryServer;
use redis_cache_adapter::{error::Result, AdapterConfig, CacheBackend, Payload};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Example entity: Employment
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
struct Employment {
    id: String,
    employer_name: String,
    salary: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Redis Cache Adapter - Basic Example ===\n");

    // 1. Initialize the store and the adapter
    println!("1. Initializing adapter over the in-memory store...");
    let server = InMemoryServer::new();
    let config = AdapterConfig::default().with_prefix("demo:").with_lifetime(600);
    let mut cache = CacheBackend::new(server.clone(), BinaryCodec::<Employment>::new(), config.clone())
        .with_metrics(Box::new(LogMetrics));
    cache.connect().await?;
    println!("   ✓ Adapter ready ({})\n", cache.connection_state());

    // 2. Save and read back an entity
    println!("2. Saving employment emp_001:");
    let employment = Employment {
        id: "emp_001".to_string(),
        employer_name: "Acme Corp".to_string(),
        salary: 75000.0,
    };
    cache
        .save()
        .key("employment:emp_001")
        .value(employment.clone())
        .ttl(300)
        .execute()
        .await?;

    if let Some(Payload::Value(emp)) = cache.get("employment:emp_001").await? {
        println!(
            "   ✓ Employment loaded from cache: {} (${:.2})\n",
            emp.employer_name, emp.salary
        );
    }

    // 3. Counters
    println!("3. Counting page views:");
    cache.increment(Some("views"), 10).await?;
    let views = cache.decrement(None, 3).await?;
    println!("   ✓ views = {}\n", views);

    // 4. Enumerate tracked keys
    println!("4. Tracked keys:");
    for key in cache.query_keys(Some("demo:employment:")).await? {
        println!("   - {}", key);
    }
    println!();

    // 5. Output capture: start, write, save
    println!("5. Capturing a rendered fragment:");
    let mut fragments = CacheBackend::new(server.clone(), OutputCodec::new(), config);
    if fragments.start("fragment:sidebar", Some(120)).await?.is_none() {
        write!(fragments.codec_mut(), "<ul><li>{}</li></ul>", employment.employer_name)
            .map_err(|e| redis_cache_adapter::Error::SerializationError(e.to_string()))?;
        print!("   ✓ Emitted: ");
        fragments.save().execute().await?;
        println!();
    }
    if let Some(Payload::Value(html)) = fragments.get("fragment:sidebar").await? {
        println!("   ✓ Fragment served from cache: {}\n", html);
    }

    // 6. Flush everything tracked
    println!("6. Flushing:");
    cache.flush().await?;
    println!(
        "   ✓ {} tracked keys remain\n",
        cache.query_keys(None).await?.len()
    );

    println!("=== Example Complete ===\n");

    Ok(())
}
