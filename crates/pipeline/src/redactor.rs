// Reversible redaction marking
//
// The redaction record is the source of truth; the visible effect (a blur
// or equivalent) belongs to the host and is reached through an optional
// callback. Apply and remove are both idempotent.

use feedveil_core::{Unit, UnitId};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::debug;

/// Host callback observing redaction changes: (unit, applied)
pub type RedactionEffect = dyn Fn(&Unit, bool) + Send + Sync;

#[derive(Default)]
pub struct Redactor {
  applied: Mutex<HashSet<UnitId>>,
  effect: Option<Box<RedactionEffect>>,
}

impl Redactor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_effect(effect: impl Fn(&Unit, bool) + Send + Sync + 'static) -> Self {
    Self {
      applied: Mutex::new(HashSet::new()),
      effect: Some(Box::new(effect)),
    }
  }

  /// Mark the unit redacted; no-op when already redacted
  ///
  /// Returns whether this call changed anything.
  pub fn apply(&self, unit: &Unit) -> bool {
    let newly_applied = {
      let Ok(mut applied) = self.applied.lock() else {
        return false;
      };
      applied.insert(unit.id.clone())
    };

    if newly_applied {
      debug!("Redacting unit {} ({:?})", unit.id, unit.title);
      if let Some(effect) = &self.effect {
        effect(unit, true);
      }
    }

    newly_applied
  }

  /// Clear the unit's redaction; no-op when not redacted
  pub fn remove(&self, unit: &Unit) -> bool {
    let removed = {
      let Ok(mut applied) = self.applied.lock() else {
        return false;
      };
      applied.remove(&unit.id)
    };

    if removed {
      debug!("Unredacting unit {}", unit.id);
      if let Some(effect) = &self.effect {
        effect(unit, false);
      }
    }

    removed
  }

  pub fn is_redacted(&self, id: &UnitId) -> bool {
    self.applied.lock().map(|a| a.contains(id)).unwrap_or(false)
  }

  pub fn redacted_count(&self) -> usize {
    self.applied.lock().map(|a| a.len()).unwrap_or(0)
  }
}
