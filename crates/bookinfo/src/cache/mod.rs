//! Bounded in-memory caches for search results and book records.
//!
//! The [`LookupService`](crate::LookupService) keeps two independent caches:
//!
//! - the search cache, keyed by the lowercased search term, holding the ordered result list;
//! - the record cache, keyed by ISBN exactly as requested, holding single books.
//!
//! Both go through the [`Cache`] trait so callers can supply their own implementation. When
//! caching is disabled both slots hold a [`NoCache`], which misses on every read.
mod stats;

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::trace;
use moka::{notification::RemovalCause, policy::EvictionPolicy};

use crate::{Book, BookList};

pub use stats::CacheStats;

/// Default capacity of the search cache.
pub const DEFAULT_SEARCH_CAPACITY: usize = 35;

/// Default capacity of the record cache.
pub const DEFAULT_RECORD_CAPACITY: usize = 200;

/// What a [`Cache::put`] did with the value it was given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// The value was stored, after evicting `evicted` other entries to make room.
    Stored {
        /// Entries dropped to stay within capacity.
        evicted: u64,
    },
    /// The value was thrown away.
    Dropped,
}

/// A thread-safe key/value cache.
///
/// Implementations must never hold more entries than their capacity. `get` and `put` should be
/// cheap, they are called while serving every lookup.
pub trait Cache<V>: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<V>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: String, value: V) -> Insertion;
}

/// A [`Cache`] that stores nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl<V> Cache<V> for NoCache {
    fn get(&self, _: &str) -> Option<V> {
        None
    }

    fn put(&self, _: String, _: V) -> Insertion {
        Insertion::Dropped
    }
}

/// A [`Cache`] evicting the least recently used entry once it is full.
pub struct LruCache<V> {
    entries: moka::sync::Cache<String, V>,
    evicted: Arc<AtomicU64>,
    capacity: NonZeroUsize,
}

impl<V> LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        let evicted = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&evicted);

        let entries = moka::sync::Cache::builder()
            .max_capacity(u64::try_from(capacity.get()).unwrap_or(u64::MAX))
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(move |key: Arc<String>, _, cause| {
                if cause == RemovalCause::Size {
                    trace!("Evicted '{key}'");
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
            .build();

        Self {
            entries,
            evicted,
            capacity,
        }
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX)
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}

impl<V> Cache<V> for LruCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key)
    }

    fn put(&self, key: String, value: V) -> Insertion {
        self.entries.insert(key, value);
        // evict right away so the capacity holds once `put` returns
        self.entries.run_pending_tasks();

        Insertion::Stored {
            evicted: self.evicted.swap(0, Ordering::Relaxed),
        }
    }
}

impl<V, C> Cache<V> for Arc<C>
where
    C: Cache<V> + ?Sized,
{
    fn get(&self, key: &str) -> Option<V> {
        (**self).get(key)
    }

    fn put(&self, key: String, value: V) -> Insertion {
        (**self).put(key, value)
    }
}

/// A cache together with the statistics of its use.
struct Tracked<V> {
    name: &'static str,
    cache: Box<dyn Cache<V>>,
    stats: CacheStats,
}

impl<V> Tracked<V> {
    fn new(name: &'static str, cache: Box<dyn Cache<V>>) -> Self {
        Self {
            name,
            cache,
            stats: CacheStats::new(),
        }
    }

    fn get(&self, key: &str) -> Option<V> {
        let value = self.cache.get(key);

        if value.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        value
    }

    fn put(&self, key: String, value: V) {
        match self.cache.put(key, value) {
            Insertion::Stored { evicted } => {
                self.stats.record_insert();
                if evicted > 0 {
                    trace!("{evicted} entry(s) evicted from the {} cache", self.name);
                    self.stats.record_evictions(evicted);
                }
            }
            Insertion::Dropped => trace!("Write to the {} cache dropped", self.name),
        }
    }
}

/// The search and record caches used by a [`LookupService`](crate::LookupService).
pub(crate) struct CacheStore {
    search: Tracked<BookList>,
    record: Tracked<Arc<Book>>,
}

impl CacheStore {
    pub(crate) fn new(
        search: Box<dyn Cache<BookList>>,
        record: Box<dyn Cache<Arc<Book>>>,
    ) -> Self {
        Self {
            search: Tracked::new("search", search),
            record: Tracked::new("record", record),
        }
    }

    /// A store where every read misses and every write is dropped.
    pub(crate) fn disabled() -> Self {
        Self::new(Box::new(NoCache), Box::new(NoCache))
    }

    pub(crate) fn search(&self, term: &str) -> Option<BookList> {
        self.search.get(term)
    }

    pub(crate) fn put_search(&self, term: String, books: BookList) {
        self.search.put(term, books);
    }

    pub(crate) fn record(&self, isbn: &str) -> Option<Arc<Book>> {
        self.record.get(isbn)
    }

    pub(crate) fn put_record(&self, isbn: String, book: Arc<Book>) {
        self.record.put(isbn, book);
    }

    pub(crate) const fn search_stats(&self) -> &CacheStats {
        &self.search.stats
    }

    pub(crate) const fn record_stats(&self) -> &CacheStats {
        &self.record.stats
    }
}
