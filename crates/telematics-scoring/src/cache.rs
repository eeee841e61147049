//! In-memory result cache with per-entry TTL
//!
//! Keys are `{kind}_{subject}_{window_days}`. Expired entries are dropped
//! lazily on read. Concurrent writers to the same key race; last write wins.
//! Clocks come from `tokio::time` so tests can pause and advance time.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use telematics_common::{Result, ScoreResult};
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::stats::DrivingStats;
use crate::trend::RiskTrend;

/// Cached result family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    RiskScore,
    DrivingStats,
    RiskTrend,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::RiskScore => "risk-score",
            CacheKind::DrivingStats => "driving-stats",
            CacheKind::RiskTrend => "risk-trend",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub subject_id: String,
    pub window_days: u32,
}

impl CacheKey {
    pub fn new(kind: CacheKind, subject_id: impl Into<String>, window_days: u32) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            window_days,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.kind, self.subject_id, self.window_days)
    }
}

/// Cached computation result
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Score(ScoreResult),
    Trend(RiskTrend),
    Stats(DrivingStats),
}

impl CachedValue {
    pub fn into_score(self) -> Option<ScoreResult> {
        match self {
            CachedValue::Score(score) => Some(score),
            _ => None,
        }
    }

    pub fn into_trend(self) -> Option<RiskTrend> {
        match self {
            CachedValue::Trend(trend) => Some(trend),
            _ => None,
        }
    }

    pub fn into_stats(self) -> Option<DrivingStats> {
        match self {
            CachedValue::Stats(stats) => Some(stats),
            _ => None,
        }
    }
}

struct CacheEntry {
    key: CacheKey,
    value: CachedValue,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Entries currently held, including expired ones not yet purged
    pub entry_count: usize,
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
}

/// Process-wide result cache
#[derive(Default)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh value for a key, purging it if expired
    #[instrument(skip(self), fields(key = %key))]
    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let cache_key = key.to_string();
        let now = Instant::now();

        let value = match self.entries.get(&cache_key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss");
                return None;
            }
        };

        match value {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit");
                Some(value)
            }
            None => {
                // Read guard released above; re-check under the write lock
                self.entries
                    .remove_if(&cache_key, |_, entry| entry.is_expired(now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache expired");
                None
            }
        }
    }

    /// Store a value with a TTL in minutes
    pub fn set(&self, key: CacheKey, value: CachedValue, ttl_minutes: u64) {
        self.set_with_ttl(key, value, Duration::from_secs(ttl_minutes * 60));
    }

    pub fn set_with_ttl(&self, key: CacheKey, value: CachedValue, ttl: Duration) {
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cached result");
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                key,
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Cached value, or compute and store it. Errors are not cached.
    pub async fn get_or_insert_with<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedValue>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = compute().await?;
        self.set_with_ttl(key, value.clone(), ttl);
        Ok(value)
    }

    /// Drop every entry
    pub fn clear(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(dropped, "Cleared result cache");
    }

    /// Drop every entry for one subject, returning how many were removed
    #[instrument(skip(self))]
    pub fn invalidate_subject(&self, subject_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.key.subject_id != subject_id);
        let removed = before.saturating_sub(self.entries.len());
        debug!(removed, "Invalidated subject entries");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        CacheStats {
            entry_count: keys.len(),
            keys,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
