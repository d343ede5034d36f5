//! Result Cache - content-addressed memo of scoring results
//!
//! - Keys are hashes of the normalized title and content, not article ids
//! - Entries expire after a TTL and are evicted when read stale
//! - Capacity is bounded: expired entries go first, then the oldest 20%
//! - Batches are split into cached results and articles still to score

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::text::normalize_whitespace;
use crate::{
    Article, CoreError, PersistenceBackend, SentimentResult, DEFAULT_CACHE_CAPACITY,
    DEFAULT_CACHE_TTL_HOURS,
};

/// Characters of normalized text that feed the key
const KEY_TEXT_CHARS: usize = 200;

/// Persisted blob layout version
const SNAPSHOT_VERSION: u32 = 1;

/// Cache tuning
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry lifetime
    pub ttl: Duration,
    /// Maximum number of entries
    pub max_entries: usize,
    /// Fill ratio above which oldest entries are dropped after purging
    pub purge_ratio: f64,
    /// Fraction of entries dropped by age-based eviction
    pub evict_fraction: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(DEFAULT_CACHE_TTL_HOURS),
            max_entries: DEFAULT_CACHE_CAPACITY,
            purge_ratio: 0.8,
            evict_fraction: 0.2,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }
}

/// A memoized result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEntry {
    pub key: String,
    pub result: SentimentResult,
    pub timestamp: DateTime<Utc>,
    pub article_id: String,
}

impl CachedEntry {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp >= ttl
    }
}

/// A cache hit inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult {
    pub article_id: String,
    pub result: SentimentResult,
}

/// Batch split into hits and work items
#[derive(Debug, Clone, Default)]
pub struct BatchPartition {
    pub cached: Vec<CachedResult>,
    pub to_analyze: Vec<Article>,
}

/// Outcome of a warm-start attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing persisted under the key
    Empty,
    /// Entries restored (expired ones skipped)
    Restored { entries: usize, skipped: usize },
    /// Blob was unreadable and has been dropped
    Corrupt,
    /// Backend failed; cache stays cold
    Unavailable,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired_evictions: u64,
    pub capacity_evictions: u64,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    entries: Vec<CachedEntry>,
}

/// Hash of the lower-cased, whitespace-normalized title and content
pub fn cache_key(title: &str, content: &str) -> String {
    let normalized = normalize_whitespace(&format!("{} {}", title, content).to_lowercase());
    let prefix: String = normalized.chars().take(KEY_TEXT_CHARS).collect();

    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// TTL cache of scoring results keyed by content hash
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    entries: HashMap<String, CachedEntry>,
    config: CacheConfig,
    stats: CacheStats,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            stats: CacheStats::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fresh result for this text, evicting it if stale
    pub fn get(&mut self, id: &str, title: &str, content: &str) -> Option<SentimentResult> {
        self.get_at(id, title, content, Utc::now())
    }

    pub fn get_at(
        &mut self,
        _id: &str,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Option<SentimentResult> {
        let key = cache_key(title, content);

        let expired = match self.entries.get(&key) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now, self.config.ttl),
        };

        if expired {
            self.entries.remove(&key);
            self.stats.expired_evictions += 1;
            self.stats.misses += 1;
            debug!("Evicted stale cache entry {}", key);
            return None;
        }

        self.stats.hits += 1;
        self.entries.get(&key).map(|e| e.result.clone())
    }

    /// Store a result under the text's key
    pub fn set(&mut self, id: &str, title: &str, content: &str, result: SentimentResult) {
        self.set_at(id, title, content, result, Utc::now());
    }

    pub fn set_at(
        &mut self,
        id: &str,
        title: &str,
        content: &str,
        result: SentimentResult,
        now: DateTime<Utc>,
    ) {
        let key = cache_key(title, content);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.make_room(now);
        }

        self.entries.insert(
            key.clone(),
            CachedEntry {
                key,
                result,
                timestamp: now,
                article_id: id.to_string(),
            },
        );
    }

    /// Split articles into cache hits and misses
    pub fn analyze_batch(&mut self, articles: &[Article]) -> BatchPartition {
        self.analyze_batch_at(articles, Utc::now())
    }

    pub fn analyze_batch_at(&mut self, articles: &[Article], now: DateTime<Utc>) -> BatchPartition {
        let mut partition = BatchPartition::default();

        for article in articles {
            match self.get_at(&article.id, &article.title, &article.content, now) {
                Some(result) => partition.cached.push(CachedResult {
                    article_id: article.id.clone(),
                    result,
                }),
                None => partition.to_analyze.push(article.clone()),
            }
        }

        debug!(
            "Batch of {}: {} cached, {} to analyze",
            articles.len(),
            partition.cached.len(),
            partition.to_analyze.len()
        );
        partition
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.config.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now, ttl));
        let removed = before - self.entries.len();
        self.stats.expired_evictions += removed as u64;
        removed
    }

    fn make_room(&mut self, now: DateTime<Utc>) {
        let purged = self.purge_expired(now);

        let high_water = (self.config.max_entries as f64 * self.config.purge_ratio) as usize;
        if self.entries.len() <= high_water {
            debug!("Cache purge freed {} expired entries", purged);
            return;
        }

        let evict = ((self.entries.len() as f64) * self.config.evict_fraction).ceil() as usize;
        let mut by_age: Vec<(DateTime<Utc>, String)> = self
            .entries
            .values()
            .map(|e| (e.timestamp, e.key.clone()))
            .collect();
        by_age.sort();

        for (_, key) in by_age.into_iter().take(evict) {
            self.entries.remove(&key);
        }
        self.stats.capacity_evictions += evict as u64;
        info!(
            "Cache at capacity: purged {} expired, evicted {} oldest",
            purged, evict
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }

    /// Serialize live entries
    pub fn to_bytes(&self, now: DateTime<Utc>) -> Result<Vec<u8>, CoreError> {
        let ttl = self.config.ttl;
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: now,
            entries: self
                .entries
                .values()
                .filter(|e| !e.is_expired(now, ttl))
                .cloned()
                .collect(),
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    /// Replace contents from a serialized snapshot, skipping expired entries
    pub fn restore(&mut self, bytes: &[u8], now: DateTime<Utc>) -> Result<(usize, usize), CoreError> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CoreError::Serialization(serde::de::Error::custom(format!(
                "unsupported snapshot version {}",
                snapshot.version
            ))));
        }

        let ttl = self.config.ttl;
        let total = snapshot.entries.len();
        let mut entries: Vec<CachedEntry> = snapshot
            .entries
            .into_iter()
            .filter(|e| !e.is_expired(now, ttl))
            .collect();
        let skipped = total - entries.len();

        // Keep the newest when the snapshot exceeds capacity
        if entries.len() > self.config.max_entries {
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            entries.truncate(self.config.max_entries);
        }

        self.entries = entries.into_iter().map(|e| (e.key.clone(), e)).collect();
        Ok((self.entries.len(), skipped))
    }

    /// Persist live entries under `key`
    pub fn save_to(&self, backend: &dyn PersistenceBackend, key: &str) -> Result<usize, CoreError> {
        let now = Utc::now();
        let bytes = self.to_bytes(now)?;
        backend.save(key, &bytes)?;
        Ok(self.entries.len())
    }

    /// Warm-start from `key`; never fails, falls back to a cold cache
    pub fn load_from(&mut self, backend: &dyn PersistenceBackend, key: &str) -> LoadOutcome {
        self.load_from_at(backend, key, Utc::now())
    }

    pub fn load_from_at(
        &mut self,
        backend: &dyn PersistenceBackend,
        key: &str,
        now: DateTime<Utc>,
    ) -> LoadOutcome {
        let bytes = match backend.load(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return LoadOutcome::Empty,
            Err(e) => {
                warn!("Cache backend unavailable, starting cold: {}", e);
                return LoadOutcome::Unavailable;
            }
        };

        match self.restore(&bytes, now) {
            Ok((entries, skipped)) => {
                info!("Restored {} cached results ({} expired skipped)", entries, skipped);
                LoadOutcome::Restored { entries, skipped }
            }
            Err(e) => {
                warn!("Dropping corrupt cache blob '{}': {}", key, e);
                self.entries.clear();
                if let Err(e) = backend.remove(key) {
                    warn!("Failed to remove corrupt cache blob: {}", e);
                }
                LoadOutcome::Corrupt
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, Sentiment};

    fn result(score: f64) -> SentimentResult {
        SentimentResult {
            sentiment: Sentiment::from_score(score, 0.1),
            score,
            confidence: 0.7,
            ..Default::default()
        }
    }

    #[test]
    fn test_key_ignores_case_and_whitespace() {
        assert_eq!(
            cache_key("Grand  Succès", "Le texte\n suit."),
            cache_key("grand succès", "le texte suit.")
        );
        assert_ne!(cache_key("Titre", "A"), cache_key("Titre", "B"));
        assert_eq!(cache_key("t", "c").len(), 16);
    }

    #[test]
    fn test_key_uses_first_200_chars() {
        let base = "a".repeat(300);
        assert_eq!(cache_key("t", &format!("{}x", base)), cache_key("t", &format!("{}y", base)));
    }

    #[test]
    fn test_get_after_set_until_ttl() {
        let mut cache = ResultCache::new(CacheConfig::default());
        let t0 = Utc::now();

        cache.set_at("a1", "Titre", "Contenu", result(0.5), t0);
        assert_eq!(cache.get_at("a1", "Titre", "Contenu", t0 + Duration::hours(23)), Some(result(0.5)));

        // Same text under another id shares the entry
        assert!(cache.get_at("other", "Titre", "Contenu", t0).is_some());

        assert_eq!(cache.get_at("a1", "Titre", "Contenu", t0 + Duration::hours(24)), None);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired_evictions, 1);
    }

    #[test]
    fn test_capacity_purges_expired_first() {
        let config = CacheConfig::default().with_max_entries(10);
        let mut cache = ResultCache::new(config);
        let t0 = Utc::now();

        for i in 0..5 {
            cache.set_at(&format!("old{i}"), &format!("old {i}"), "x", result(0.1), t0);
        }
        let t1 = t0 + Duration::hours(25);
        for i in 0..5 {
            cache.set_at(&format!("new{i}"), &format!("new {i}"), "x", result(0.1), t1);
        }
        assert_eq!(cache.len(), 10);

        cache.set_at("extra", "extra", "x", result(0.1), t1);
        assert_eq!(cache.len(), 6);
        assert_eq!(cache.stats().capacity_evictions, 0);
    }

    #[test]
    fn test_capacity_evicts_oldest_fifth() {
        let config = CacheConfig::default().with_max_entries(10);
        let mut cache = ResultCache::new(config);
        let t0 = Utc::now();

        for i in 0..10 {
            let at = t0 + Duration::minutes(i);
            cache.set_at(&format!("a{i}"), &format!("title {i}"), "x", result(0.1), at);
        }
        let now = t0 + Duration::minutes(30);
        cache.set_at("late", "late", "x", result(0.1), now);

        assert_eq!(cache.len(), 9);
        assert!(cache.get_at("a0", "title 0", "x", now).is_none());
        assert!(cache.get_at("a1", "title 1", "x", now).is_none());
        assert!(cache.get_at("a2", "title 2", "x", now).is_some());
        assert!(cache.get_at("late", "late", "x", now).is_some());
    }

    #[test]
    fn test_analyze_batch_partition() {
        let mut cache = ResultCache::new(CacheConfig::default());
        let articles: Vec<Article> = (0..5)
            .map(|i| Article::new(&format!("a{i}"), &format!("Titre {i}"), "Contenu"))
            .collect();
        cache.set("a1", "Titre 1", "Contenu", result(0.3));
        cache.set("a3", "Titre 3", "Contenu", result(-0.3));

        let partition = cache.analyze_batch(&articles);
        assert_eq!(partition.cached.len(), 2);
        assert_eq!(partition.to_analyze.len(), 3);

        let mut ids: Vec<String> = partition
            .cached
            .iter()
            .map(|c| c.article_id.clone())
            .chain(partition.to_analyze.iter().map(|a| a.id.clone()))
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a0", "a1", "a2", "a3", "a4"]);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let store = MemoryStore::new();
        let mut cache = ResultCache::new(CacheConfig::default());
        cache.set("a1", "Titre", "Contenu", result(0.4));
        cache.save_to(&store, "cache").unwrap();

        let mut warm = ResultCache::new(CacheConfig::default());
        let outcome = warm.load_from(&store, "cache");
        assert_eq!(outcome, LoadOutcome::Restored { entries: 1, skipped: 0 });
        assert_eq!(warm.get("x", "Titre", "Contenu"), Some(result(0.4)));
    }

    #[test]
    fn test_corrupt_blob_is_dropped() {
        let store = MemoryStore::new();
        store.save("cache", b"{not json").unwrap();

        let mut cache = ResultCache::new(CacheConfig::default());
        assert_eq!(cache.load_from(&store, "cache"), LoadOutcome::Corrupt);
        assert!(cache.is_empty());
        assert!(store.load("cache").unwrap().is_none());
    }

    #[test]
    fn test_expired_entries_skipped_on_load() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        let mut cache = ResultCache::new(CacheConfig::default());
        cache.set_at("a1", "Titre", "Contenu", result(0.4), t0);
        store.save("cache", &cache.to_bytes(t0).unwrap()).unwrap();

        let mut warm = ResultCache::new(CacheConfig::default());
        let outcome = warm.load_from_at(&store, "cache", t0 + Duration::hours(30));
        assert_eq!(outcome, LoadOutcome::Restored { entries: 0, skipped: 1 });
    }
}
