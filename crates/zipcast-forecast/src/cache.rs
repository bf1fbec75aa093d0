//! In-memory forecast cache keyed by postal code.
//!
//! Entries live for a fixed 30 minutes. An expired entry is never returned:
//! lookups evict it on sight, and [`spawn_sweeper`] clears the rest in the
//! background. One instance is created at startup and shared via `Arc`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::types::ForecastData;

/// Lifetime of a cached forecast.
pub const CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ForecastData,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= CACHE_TTL
    }
}

/// Thread-safe, time-bounded forecast cache.
pub struct ForecastCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    max_entries: Option<usize>,
}

impl ForecastCache {
    /// Create an empty, unbounded cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty, unbounded cache driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            max_entries: None,
        }
    }

    /// Bound the number of postal codes held; the least recently stored
    /// entry is dropped to make room.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Look up a live forecast for `postal_code`.
    pub fn get(&self, postal_code: &str) -> Option<ForecastData> {
        let key = postal_code.trim();
        let now = self.clock.now();

        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => {
                    tracing::debug!("Forecast cache miss for {}", key);
                    return None;
                }
                Some(entry) if !entry.is_expired(now) => {
                    tracing::debug!("Forecast cache hit for {}", key);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent put may have replaced it.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            tracing::debug!("Evicted expired forecast for {}", key);
        }
        None
    }

    /// Store a forecast, replacing any existing entry for the key.
    pub fn put(&self, postal_code: &str, value: ForecastData) {
        let key = postal_code.trim().to_string();
        let now = self.clock.now();
        let mut entries = self.entries.write();

        if let Some(max) = self.max_entries {
            if !entries.contains_key(&key) && entries.len() >= max {
                entries.retain(|_, entry| !entry.is_expired(now));
            }
            if !entries.contains_key(&key) && entries.len() >= max {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                    tracing::debug!("Forecast cache full, evicted {}", oldest);
                }
            }
        }

        tracing::debug!("Cached forecast for {}", key);
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically purge expired entries until `cancel` fires.
pub fn spawn_sweeper(
    cache: Arc<ForecastCache>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Forecast cache sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = cache.purge_expired();
                    if removed > 0 {
                        tracing::debug!("Swept {} expired forecasts", removed);
                    }
                }
            }
        }
    })
}
