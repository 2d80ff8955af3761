// Cache-through keyword provider
//
// Lookup order: fresh in-memory set -> fresh persisted set -> remote fetch.
// A failed fetch falls back to the last persisted set (even stale), then to
// an empty set. Callers never see an error and never wait on anything but
// the transport.

use crate::source::KeywordSource;
use cache::Cache;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const NAMESPACE: &str = "keywords";
const KEY: &str = "category";

/// An immutable lowercase word set with its fetch time
///
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone)]
pub struct KeywordSet {
  words: HashSet<String>,
  fetched_at: DateTime<Utc>,
}

impl KeywordSet {
  pub fn new(words: impl IntoIterator<Item = String>, fetched_at: DateTime<Utc>) -> Self {
    Self {
      words: words.into_iter().map(|w| w.to_lowercase()).collect(),
      fetched_at,
    }
  }

  pub fn empty(fetched_at: DateTime<Utc>) -> Self {
    Self {
      words: HashSet::new(),
      fetched_at,
    }
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn contains(&self, word: &str) -> bool {
    self.words.contains(word)
  }

  pub fn words(&self) -> impl Iterator<Item = &str> {
    self.words.iter().map(String::as_str)
  }

  pub fn fetched_at(&self) -> DateTime<Utc> {
    self.fetched_at
  }

  /// Whether the set is still within its TTL at the given instant
  pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX);
    now - self.fetched_at <= ttl
  }
}

/// TTL-cached keyword provider over a remote source
pub struct CachedKeywords<S> {
  source: S,
  cache: Arc<Cache>,
  ttl: Duration,
  current: RwLock<Option<Arc<KeywordSet>>>,
}

impl<S: KeywordSource> CachedKeywords<S> {
  pub fn new(source: S, cache: Arc<Cache>, ttl: Duration) -> Self {
    Self {
      source,
      cache,
      ttl,
      current: RwLock::new(None),
    }
  }

  /// Get the current keyword set, refreshing past TTL
  ///
  /// Infallible: the worst case is an empty set.
  pub async fn get(&self) -> Arc<KeywordSet> {
    let now = Utc::now();

    {
      let current = self.current.read().await;
      if let Some(set) = current.as_ref()
        && set.is_fresh(self.ttl, now)
      {
        return Arc::clone(set);
      }
    }

    self.refresh(now).await
  }

  /// Refresh under the write lock so concurrent stale readers coalesce
  /// onto one fetch
  async fn refresh(&self, now: DateTime<Utc>) -> Arc<KeywordSet> {
    let mut current = self.current.write().await;

    // Another caller may have refreshed while we waited for the lock
    if let Some(set) = current.as_ref()
      && set.is_fresh(self.ttl, now)
    {
      return Arc::clone(set);
    }

    // Persisted set from a previous process
    let mut stale: Option<KeywordSet> = None;
    if let Some((words, stored_at)) = self.cache.get_with_meta::<Vec<String>>(NAMESPACE, KEY) {
      let set = KeywordSet::new(words, stored_at);
      if set.is_fresh(self.ttl, now) {
        debug!("Using persisted keyword set ({} words)", set.len());
        let set = Arc::new(set);
        *current = Some(Arc::clone(&set));
        return set;
      }
      stale = Some(set);
    }

    match self.source.fetch().await {
      Ok(words) => {
        self.cache.set(NAMESPACE, KEY, &words, None);
        let set = Arc::new(KeywordSet::new(words, now));
        info!("Refreshed keyword set: {} words", set.len());
        *current = Some(Arc::clone(&set));
        set
      }
      Err(e) => {
        warn!("Keyword fetch failed: {}", e);
        if let Some(set) = stale {
          info!("Serving stale keyword set ({} words) after failed refresh", set.len());
          // Left out of `current` so the next call retries the fetch
          return Arc::new(set);
        }
        debug!("No cached keyword set available, serving empty set");
        Arc::new(KeywordSet::empty(now))
      }
    }
  }
}
