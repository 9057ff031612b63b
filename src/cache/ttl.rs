//! Generic TTL cache with in-flight request coalescing

use crate::error::Result;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default memoization window for settings and user lookups
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

type Loader<K, V> = Arc<dyn Fn(K) -> BoxFuture<'static, Result<V>> + Send + Sync>;
type InFlight<V> = Shared<BoxFuture<'static, Result<V>>>;

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Calls that joined a lookup already in flight
    pub coalesced: u64,
    /// Underlying lookups actually issued
    pub lookups: u64,
    pub lookup_errors: u64,
}

enum Slot<V> {
    Ready { value: V, stored_at: Instant },
    /// `generation` identifies the lookup that owns the slot
    Pending { generation: u64, lookup: InFlight<V> },
}

impl<V> Slot<V> {
    fn is_owned_by(&self, lookup_generation: u64) -> bool {
        matches!(self, Slot::Pending { generation, .. } if *generation == lookup_generation)
    }
}

enum Claim<V> {
    Hit(V),
    Joined(InFlight<V>),
    Started(InFlight<V>),
}

/// Memoizes an async `K -> V` lookup for a fixed window.
///
/// While a lookup is pending its shared future sits in the map, so every
/// caller for that key awaits the same outcome. The shared future commits
/// its own result, but only while the slot still belongs to it: success
/// replaces the pending slot with a ready entry, failure removes it so the
/// next call retries. A lookup whose slot was invalidated in the meantime
/// still answers its waiters and leaves the map alone.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: Arc<DashMap<K, Slot<V>>>,
    loader: Loader<K, V>,
    ttl: Duration,
    stats: Arc<RwLock<CacheStats>>,
    generations: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache over `loader` with the default 10 second window
    pub fn new<F, Fut>(name: &'static str, loader: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        Self::with_ttl(name, DEFAULT_TTL, loader)
    }

    /// Create a cache over `loader` with a custom window
    pub fn with_ttl<F, Fut>(name: &'static str, ttl: Duration, loader: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        tracing::debug!(
            cache = name,
            ttl_ms = ttl.as_millis() as u64,
            "Creating TTL cache"
        );

        Self {
            name,
            entries: Arc::new(DashMap::new()),
            loader: Arc::new(move |key| loader(key).boxed()),
            ttl,
            stats: Arc::new(RwLock::new(CacheStats::default())),
            generations: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve `key`, reusing a fresh entry or a lookup already in flight
    pub async fn get(&self, key: K) -> Result<V> {
        let in_flight = match self.claim(key.clone()) {
            Claim::Hit(value) => {
                self.stats.write().await.hits += 1;
                tracing::trace!(cache = self.name, key = ?key, "Cache hit");
                return Ok(value);
            }
            Claim::Joined(in_flight) => {
                self.stats.write().await.coalesced += 1;
                tracing::trace!(cache = self.name, key = ?key, "Joining in-flight lookup");
                in_flight
            }
            Claim::Started(in_flight) => {
                self.stats.write().await.misses += 1;
                tracing::debug!(cache = self.name, key = ?key, "Cache miss, looking up");
                in_flight
            }
        };

        in_flight.await
    }

    /// Inspect the slot for `key` and, on a miss, install a pending lookup
    /// under the same shard lock so racing callers cannot both start one.
    fn claim(&self, key: K) -> Claim<V> {
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let current = match occupied.get() {
                    Slot::Ready { value, stored_at } if stored_at.elapsed() < self.ttl => {
                        Some(Claim::Hit(value.clone()))
                    }
                    Slot::Pending { lookup, .. } => Some(Claim::Joined(lookup.clone())),
                    Slot::Ready { .. } => None,
                };

                match current {
                    Some(claim) => claim,
                    None => {
                        let (slot, in_flight) = self.launch(occupied.key().clone());
                        occupied.insert(slot);
                        Claim::Started(in_flight)
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let (slot, in_flight) = self.launch(vacant.key().clone());
                vacant.insert(slot);
                Claim::Started(in_flight)
            }
        }
    }

    /// Build the pending slot for a new lookup of `key`
    fn launch(&self, key: K) -> (Slot<V>, InFlight<V>) {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        // Weak so a never-polled pending slot does not keep the map alive
        let entries: Weak<DashMap<K, Slot<V>>> = Arc::downgrade(&self.entries);
        let loader = Arc::clone(&self.loader);
        let stats = Arc::clone(&self.stats);
        let name = self.name;

        let lookup = async move {
            stats.write().await.lookups += 1;
            let outcome = loader(key.clone()).await;

            match &outcome {
                Ok(value) => {
                    if let Some(entries) = entries.upgrade() {
                        if let Some(mut slot) = entries.get_mut(&key) {
                            if slot.is_owned_by(generation) {
                                *slot = Slot::Ready {
                                    value: value.clone(),
                                    stored_at: Instant::now(),
                                };
                            }
                        }
                    }
                }
                Err(e) => {
                    stats.write().await.lookup_errors += 1;
                    tracing::debug!(cache = name, key = ?key, error = %e, "Lookup failed, not caching");
                    if let Some(entries) = entries.upgrade() {
                        entries.remove_if(&key, |_, slot| slot.is_owned_by(generation));
                    }
                }
            }

            outcome
        }
        .boxed()
        .shared();

        (
            Slot::Pending {
                generation,
                lookup: lookup.clone(),
            },
            lookup,
        )
    }

    /// Drop the entry for `key`; the next `get` performs a fresh lookup
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries, including expired and in-flight ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries (for periodic cleanup); in-flight lookups are kept
    pub fn cleanup_stale(&self) -> usize {
        let ttl = self.ttl;
        let initial = self.entries.len();

        self.entries.retain(|_, slot| match slot {
            Slot::Ready { stored_at, .. } => stored_at.elapsed() < ttl,
            Slot::Pending { .. } => true,
        });

        let removed = initial.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(
                cache = self.name,
                removed = removed,
                remaining = self.entries.len(),
                "Cleaned up stale cache entries"
            );
        }
        removed
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Log cache statistics (for periodic monitoring)
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        let served = stats.hits + stats.coalesced + stats.misses;

        let hit_rate = if served > 0 {
            ((stats.hits + stats.coalesced) as f32 / served as f32 * 100.0) as u32
        } else {
            0
        };

        tracing::info!(
            cache = self.name,
            entries = self.len(),
            hit_rate = hit_rate,
            lookups = stats.lookups,
            lookup_errors = stats.lookup_errors,
            "TTL cache statistics"
        );
    }
}
