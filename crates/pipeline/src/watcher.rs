// Debounced mutation watcher
//
// State machine: Idle -> Scheduled -> Scanning -> Idle. Any mutation moves
// Idle/Scanning to Scheduled and restarts the debounce timer; only a quiet
// window triggers a scan pass, so a scroll-triggered burst costs one pass
// instead of one per mutation record. Mutations arriving during a pass
// re-arm the timer after it completes - no region missed, no pass dropped.

use crate::mutation::MutationEvent;
use feedveil_core::WatchConfig;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace, warn};

/// Watcher lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
  Idle,
  Scheduled,
  Scanning,
}

/// Debounces mutation events into scan passes
pub struct ChangeWatcher {
  rx: mpsc::Receiver<MutationEvent>,
  debounce: Duration,
  max_pending: usize,
}

impl ChangeWatcher {
  pub fn new(rx: mpsc::Receiver<MutationEvent>, config: &WatchConfig) -> Self {
    Self {
      rx,
      debounce: Duration::from_millis(config.debounce_ms),
      max_pending: config.max_pending_events.max(1),
    }
  }

  /// Run until the mutation channel closes, invoking one scan pass per
  /// quiet debounce window
  ///
  /// Pending work is flushed before the watcher ends.
  pub async fn run<F, Fut>(mut self, mut scan: F)
  where
    F: FnMut(Vec<MutationEvent>) -> Fut,
    Fut: Future<Output = ()>,
  {
    let mut pending: Vec<MutationEvent> = Vec::new();
    let mut closed = false;

    'idle: loop {
      if pending.is_empty() {
        if closed {
          break;
        }
        trace!("watch state: {:?}", WatchState::Idle);
        match self.rx.recv().await {
          Some(event) => pending.push(event),
          None => break,
        }
      }

      // Scheduled: every further mutation restarts the window
      loop {
        trace!("watch state: {:?} ({} pending)", WatchState::Scheduled, pending.len());

        if pending.len() >= self.max_pending {
          warn!("{} mutation events pending, forcing a scan pass", pending.len());
        } else if !closed {
          let deadline = Instant::now() + self.debounce;
          let mut quiet = false;
          while !quiet {
            tokio::select! {
              maybe = self.rx.recv() => match maybe {
                Some(event) => {
                  pending.push(event);
                  // Restart the debounce window
                  continue 'idle;
                }
                None => {
                  closed = true;
                  quiet = true;
                }
              },
              _ = sleep_until(deadline) => quiet = true,
            }
          }
        }

        trace!("watch state: {:?}", WatchState::Scanning);
        let batch = std::mem::take(&mut pending);
        debug!("Scan pass over {} mutation events", batch.len());
        scan(batch).await;

        // Mutations that arrived during the pass re-arm the window
        while let Ok(event) = self.rx.try_recv() {
          pending.push(event);
        }
        if pending.is_empty() {
          continue 'idle;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn config(debounce_ms: u64) -> WatchConfig {
    WatchConfig {
      debounce_ms,
      max_pending_events: 100,
    }
  }

  #[tokio::test]
  async fn test_burst_coalesces_into_one_pass() {
    let (tx, rx) = mpsc::channel(64);
    let watcher = ChangeWatcher::new(rx, &config(50));

    let passes = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&passes);

    let handle = tokio::spawn(async move {
      watcher
        .run(move |_batch| {
          let counted = Arc::clone(&counted);
          async move {
            counted.fetch_add(1, Ordering::SeqCst);
          }
        })
        .await;
    });

    // Ten mutations in quick succession, well inside the window
    for i in 0..10 {
      tx.send(MutationEvent::single(format!("<div>{}</div>", i))).await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(passes.load(Ordering::SeqCst), 1);

    drop(tx);
    handle.await.unwrap();
  }

  #[tokio::test]
  async fn test_separate_bursts_get_separate_passes() {
    let (tx, rx) = mpsc::channel(64);
    let watcher = ChangeWatcher::new(rx, &config(30));

    let passes = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&passes);

    let handle = tokio::spawn(async move {
      watcher
        .run(move |_batch| {
          let counted = Arc::clone(&counted);
          async move {
            counted.fetch_add(1, Ordering::SeqCst);
          }
        })
        .await;
    });

    tx.send(MutationEvent::single("<div>a</div>")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    tx.send(MutationEvent::single("<div>b</div>")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(passes.load(Ordering::SeqCst), 2);

    drop(tx);
    handle.await.unwrap();
  }

  #[tokio::test]
  async fn test_batch_carries_all_events() {
    let (tx, rx) = mpsc::channel(64);
    let watcher = ChangeWatcher::new(rx, &config(30));

    let seen = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&seen);

    let handle = tokio::spawn(async move {
      watcher
        .run(move |batch| {
          let counted = Arc::clone(&counted);
          async move {
            counted.fetch_add(batch.len() as u32, Ordering::SeqCst);
          }
        })
        .await;
    });

    for i in 0..5 {
      tx.send(MutationEvent::single(format!("<div>{}</div>", i))).await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(seen.load(Ordering::SeqCst), 5);

    drop(tx);
    handle.await.unwrap();
  }

  #[tokio::test]
  async fn test_pending_flushed_on_close() {
    let (tx, rx) = mpsc::channel(64);
    // A window far longer than the test: only the close can flush
    let watcher = ChangeWatcher::new(rx, &config(10_000));

    let passes = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&passes);

    let handle = tokio::spawn(async move {
      watcher
        .run(move |_batch| {
          let counted = Arc::clone(&counted);
          async move {
            counted.fetch_add(1, Ordering::SeqCst);
          }
        })
        .await;
    });

    tx.send(MutationEvent::single("<div>last</div>")).await.unwrap();
    drop(tx);

    handle.await.unwrap();
    assert_eq!(passes.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_overflow_forces_pass() {
    let (tx, rx) = mpsc::channel(64);
    let watcher = ChangeWatcher::new(
      rx,
      &WatchConfig {
        debounce_ms: 10_000,
        max_pending_events: 3,
      },
    );

    let passes = Arc::new(AtomicU32::new(0));
    let counted = Arc::clone(&passes);

    let handle = tokio::spawn(async move {
      watcher
        .run(move |_batch| {
          let counted = Arc::clone(&counted);
          async move {
            counted.fetch_add(1, Ordering::SeqCst);
          }
        })
        .await;
    });

    for i in 0..3 {
      tx.send(MutationEvent::single(format!("<div>{}</div>", i))).await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(passes.load(Ordering::SeqCst), 1, "overflow must not wait out the window");

    drop(tx);
    handle.await.unwrap();
  }
}
