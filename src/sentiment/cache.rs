//! Opt-in score cache.
//!
//! Scoring is deterministic (same text, same model, same score), so
//! [`CachingScorer`] memoises results in a moka LRU + TTL cache keyed on a
//! content hash of the text. Repeated greetings and canned prompts then
//! skip the model entirely. Failures are never cached.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;

use super::Scorer;
use crate::Result;

/// Configuration for the score cache.
///
/// ```rust
/// # use chat_analytics::sentiment::ScoreCacheConfig;
/// # use std::time::Duration;
/// let config = ScoreCacheConfig::new()
///     .max_entries(5_000)
///     .ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreCacheConfig {
    /// Maximum number of cached scores. Default: 10,000.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Time-to-live for cached scores, in seconds. Default: 1 hour.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for ScoreCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl ScoreCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }
}

/// Decorator that caches another scorer's results.
pub struct CachingScorer {
    inner: Arc<dyn Scorer>,
    cache: Cache<u64, f64>,
}

impl CachingScorer {
    pub fn new(inner: Arc<dyn Scorer>, config: &ScoreCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();
        Self { inner, cache }
    }

    /// Cached score for `text`, if present.
    pub async fn cached(&self, text: &str) -> Option<f64> {
        self.cache.get(&cache_key(text)).await
    }
}

#[async_trait]
impl Scorer for CachingScorer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn score(&self, text: &str) -> Result<f64> {
        let key = cache_key(text);
        if let Some(score) = self.cache.get(&key).await {
            return Ok(score);
        }
        let score = self.inner.score(text).await?;
        self.cache.insert(key, score).await;
        Ok(score)
    }

    async fn ready(&self) -> Result<()> {
        self.inner.ready().await
    }
}

/// SipHash of the text; stable within one process, which is all an
/// in-memory cache needs.
fn cache_key(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_config_defaults() {
        let config = ScoreCacheConfig::default();
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.ttl_secs, 3600);
    }

    #[test]
    fn cache_key_deterministic() {
        assert_eq!(cache_key("hello"), cache_key("hello"));
        assert_ne!(cache_key("hello"), cache_key("world"));
    }
}
