// Namespaced persistent key-value store with lazy TTL expiry
//
// - One JSON file per namespace under the data directory
// - Entries carry their write time and time-to-live; expiry happens on read
// - Reads and writes are fail-soft: storage errors degrade to a miss or a
//   no-op and are logged, never propagated

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Default data directory for persistent state
pub fn default_data_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("FEEDVEIL_DATA_DIR") {
    return PathBuf::from(dir);
  }

  dirs::data_local_dir()
    .map(|p| p.join("feedveil"))
    .unwrap_or_else(|| PathBuf::from(".feedveil"))
}

/// One stored value with its write time and time-to-live
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Entry {
  value: Value,
  stored_at_ms: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  ttl_ms: Option<i64>,
}

impl Entry {
  fn is_expired(&self, now_ms: i64) -> bool {
    match self.ttl_ms {
      Some(ttl) => now_ms - self.stored_at_ms > ttl,
      None => false,
    }
  }
}

/// Namespaced persistent key-value store
pub struct Cache {
  dir: PathBuf,
  namespaces: Mutex<HashMap<String, HashMap<String, Entry>>>,
}

impl Cache {
  /// Open a cache rooted at the given directory
  ///
  /// Never fails: an unusable directory just means every read misses and
  /// every write is dropped.
  pub fn open(dir: impl Into<PathBuf>) -> Self {
    let dir = dir.into();
    if let Err(e) = std::fs::create_dir_all(&dir) {
      warn!("Cache directory {:?} unavailable: {}", dir, e);
    }

    Self {
      dir,
      namespaces: Mutex::new(HashMap::new()),
    }
  }

  /// Open a cache in the default data directory
  pub fn open_default() -> Self {
    Self::open(default_data_dir())
  }

  /// Get a value, treating entries past their TTL as absent
  pub fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
    let Ok(mut namespaces) = self.namespaces.lock() else {
      return None;
    };

    let entries = Self::namespace_entries(&self.dir, &mut namespaces, namespace);
    let expired = entries.get(key)?.is_expired(Utc::now().timestamp_millis());

    if expired {
      debug!("Cache entry {}/{} past TTL, treating as absent", namespace, key);
      entries.remove(key);
      return None;
    }

    entries.get(key).and_then(|entry| serde_json::from_value(entry.value.clone()).ok())
  }

  /// Get a value and its write time, ignoring TTL
  ///
  /// Used for explicit stale fallback when a refresh fails.
  pub fn get_with_meta<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<(T, DateTime<Utc>)> {
    let Ok(mut namespaces) = self.namespaces.lock() else {
      return None;
    };

    let entries = Self::namespace_entries(&self.dir, &mut namespaces, namespace);
    let entry = entries.get(key)?;

    let stored_at = DateTime::from_timestamp_millis(entry.stored_at_ms)?;
    let value = serde_json::from_value(entry.value.clone()).ok()?;
    Some((value, stored_at))
  }

  /// Store a value with an optional TTL
  pub fn set<T: Serialize>(&self, namespace: &str, key: &str, value: &T, ttl: Option<Duration>) {
    self.set_at(namespace, key, value, ttl, Utc::now());
  }

  /// Store a value with an explicit write time
  ///
  /// Lets callers backfill entries and lets tests age them.
  pub fn set_at<T: Serialize>(
    &self,
    namespace: &str,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
    stored_at: DateTime<Utc>,
  ) {
    let value = match serde_json::to_value(value) {
      Ok(value) => value,
      Err(e) => {
        warn!("Cache value for {}/{} not serializable: {}", namespace, key, e);
        return;
      }
    };

    let Ok(mut namespaces) = self.namespaces.lock() else {
      return;
    };

    let entries = Self::namespace_entries(&self.dir, &mut namespaces, namespace);
    entries.insert(
      key.to_string(),
      Entry {
        value,
        stored_at_ms: stored_at.timestamp_millis(),
        ttl_ms: ttl.map(|t| t.as_millis() as i64),
      },
    );

    Self::persist(&self.dir, namespace, entries);
  }

  /// Number of live (unexpired) entries in a namespace
  pub fn len(&self, namespace: &str) -> usize {
    let Ok(mut namespaces) = self.namespaces.lock() else {
      return 0;
    };

    let now_ms = Utc::now().timestamp_millis();
    Self::namespace_entries(&self.dir, &mut namespaces, namespace)
      .values()
      .filter(|e| !e.is_expired(now_ms))
      .count()
  }

  pub fn is_empty(&self, namespace: &str) -> bool {
    self.len(namespace) == 0
  }

  fn namespace_path(dir: &Path, namespace: &str) -> PathBuf {
    dir.join(format!("{}.json", namespace))
  }

  fn namespace_entries<'a>(
    dir: &Path,
    namespaces: &'a mut HashMap<String, HashMap<String, Entry>>,
    namespace: &str,
  ) -> &'a mut HashMap<String, Entry> {
    namespaces
      .entry(namespace.to_string())
      .or_insert_with(|| Self::load(dir, namespace))
  }

  fn load(dir: &Path, namespace: &str) -> HashMap<String, Entry> {
    let path = Self::namespace_path(dir, namespace);
    if !path.exists() {
      return HashMap::new();
    }

    match std::fs::read_to_string(&path) {
      Ok(contents) => match serde_json::from_str(&contents) {
        Ok(entries) => entries,
        Err(e) => {
          warn!("Corrupted cache namespace {:?}, starting empty: {}", path, e);
          HashMap::new()
        }
      },
      Err(e) => {
        warn!("Failed to read cache namespace {:?}: {}", path, e);
        HashMap::new()
      }
    }
  }

  fn persist(dir: &Path, namespace: &str, entries: &HashMap<String, Entry>) {
    let path = Self::namespace_path(dir, namespace);
    let contents = match serde_json::to_string(entries) {
      Ok(contents) => contents,
      Err(e) => {
        warn!("Failed to serialize cache namespace {}: {}", namespace, e);
        return;
      }
    };

    if let Err(e) = std::fs::write(&path, contents) {
      warn!("Failed to write cache namespace {:?}: {}", path, e);
    }
  }
}
