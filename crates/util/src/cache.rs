//! Time-boxed key/value cache.
//!
//! The authenticator keeps the last access token here, and the poller keeps
//! the polling start marker here. Validity is recomputed on every read from
//! the stored timestamp (`stored_at > now - ttl`); nothing is evicted on a
//! timer, so an entry can be logically expired while still present.
//!
//! Two stores are provided:
//! - [`MemoryCache`]: process scoped, for hosts that keep the hooks loaded
//! - [`FileCache`]: a JSON file, for hosts (and the harness binary) that
//!   start a fresh process per invocation

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock, to_time_delta};

/// Error surfaced when a cache write cannot be persisted.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait CacheStore: Send + Sync {
    /// Value stored under `key`, whether or not it is still valid.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value`, stamping it with the current time. `ttl` is recorded so
    /// that stale entries can be purged; `None` never expires on its own.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// True when the entry exists and was stored less than `ttl` ago.
    fn is_valid(&self, key: &str, ttl: Duration) -> bool;

    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Value under `key` only if it is still valid for `ttl`.
    fn get_valid(&self, key: &str, ttl: Duration) -> Option<String> {
        if self.is_valid(key, ttl) { self.get(key) } else { None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    stored_at: DateTime<Utc>,
    #[serde(default)]
    ttl_ms: Option<u64>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.stored_at < to_time_delta(ttl)
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.ttl_ms
            .is_some_and(|ttl_ms| !self.is_fresh(now, Duration::from_millis(ttl_ms)))
    }
}

fn new_entry(value: &str, now: DateTime<Utc>, ttl: Option<Duration>) -> CacheEntry {
    CacheEntry {
        value: value.to_string(),
        stored_at: now,
        ttl_ms: ttl.map(|ttl| ttl.as_millis() as u64),
    }
}

/// In-process cache.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let entry = new_entry(value, self.clock.now(), ttl);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn is_valid(&self, key: &str, ttl: Duration) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).is_some_and(|entry| entry.is_fresh(self.clock.now(), ttl))
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Cache persisted to a JSON file after every write.
///
/// Entries whose own TTL has elapsed are dropped when the file is rewritten.
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl FileCache {
    /// Open (or lazily create) the cache file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = load_entries(&path)?;
        debug!(path = %path.display(), entries = entries.len(), "cache file opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_locked(&self, entries: &mut HashMap<String, CacheEntry>) -> Result<(), CacheError> {
        let now = self.clock.now();
        entries.retain(|_, entry| !entry.is_expired(now));
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&*entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let entry = new_entry(value, self.clock.now(), ttl);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), entry);
        self.save_locked(&mut entries)
    }

    fn is_valid(&self, key: &str, ttl: Duration) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).is_some_and(|entry| entry.is_fresh(self.clock.now(), ttl))
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.save_locked(&mut entries)?;
        }
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, CacheEntry>, CacheError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(entries) => Ok(entries),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to parse cache file; starting cold");
                Ok(HashMap::new())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(error) => Err(CacheError::Io(error)),
    }
}
