//! Time-bounded result cache for listing endpoints.
//!
//! Entries are keyed by a fixed listing name (see [`keys`]) and expire a
//! fixed duration after they were written, regardless of how often they are
//! read. Writers invalidate the affected key before responding so the next
//! read goes to the database.
//!
//! A fill that started before an invalidation of its key is not stored:
//! every key carries a generation that [`ResultCache::invalidate`] bumps, and
//! [`ResultCache::remember`] only writes back under the generation it saw
//! before loading.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Default lifetime of a cached listing (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache key names.
pub mod keys {
    /// Invoice index (invoices joined with their project).
    pub const INVOICES_LIST: &str = "invoices_list";
    /// Project dropdown options (`id`, `pr_number`, `name`).
    pub const PROJECTS_LIST: &str = "projects_list";
    /// Purchase order index.
    pub const PPOS_LIST: &str = "ppos_list";
    /// Projects, categories and suppliers for the PO form.
    pub const PO_FORM_OPTIONS: &str = "po_form_options";
    /// Dropdown values for the report filters.
    pub const REPORT_FILTER_OPTIONS: &str = "report_filter_options";
}

/// Key-value store with per-entry expiry.
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry. Expired entries are treated as absent.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Remove `key`. Returns whether an entry was present.
    fn invalidate(&self, key: &str) -> bool;

    /// Remove every entry.
    fn clear(&self);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-local [`CacheStore`].
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it so the map does not grow with dead listings.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    fn set_at(&self, key: &str, value: Value, ttl: Duration, now: Instant) {
        let entry = CacheEntry {
            value,
            expires_at: now + ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    fn invalidate(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Invalidation counters. `epoch` moves on [`ResultCache::clear`].
#[derive(Debug, Default)]
struct Generations {
    epoch: u64,
    keys: HashMap<String, u64>,
}

impl Generations {
    fn of(&self, key: &str) -> (u64, u64) {
        (self.epoch, self.keys.get(key).copied().unwrap_or(0))
    }
}

/// Typed front for a [`CacheStore`] with a fixed TTL.
///
/// Cheap to clone; all clones share the same store.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    generations: Arc<Mutex<Generations>>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            generations: Arc::default(),
        }
    }

    /// A cache backed by a fresh [`InMemoryCache`].
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(InMemoryCache::new()), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Typed lookup. A stored value that no longer decodes as `T` is a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.store
            .get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Store `value` for the configured TTL. Values that fail to serialize
    /// are simply not cached.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(json) = serde_json::to_value(value) {
            self.store.set(key, json, self.ttl);
        }
    }

    /// Return the cached value for `key`, or run `loader`, cache its output
    /// and return it. Loader errors are returned and nothing is cached.
    ///
    /// If `key` is invalidated while `loader` runs, the loaded value is
    /// still returned to this caller but not cached.
    pub async fn remember<T, E, F, Fut>(&self, key: &str, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let seen = self.lock_generations().of(key);
        let value = loader().await?;

        // Held across the write so an invalidate cannot slip in between.
        let generations = self.lock_generations();
        if generations.of(key) == seen {
            self.put(key, &value);
        }
        Ok(value)
    }

    /// Remove each key in `keys` and discard fills already in flight for them.
    pub fn invalidate(&self, keys: &[&str]) {
        let mut generations = self.lock_generations();
        for key in keys {
            *generations.keys.entry((*key).to_string()).or_default() += 1;
            self.store.invalidate(key);
        }
    }

    pub fn clear(&self) {
        let mut generations = self.lock_generations();
        generations.epoch += 1;
        self.store.clear();
    }

    fn lock_generations(&self) -> std::sync::MutexGuard<'_, Generations> {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache").field("ttl", &self.ttl).finish()
    }
}
