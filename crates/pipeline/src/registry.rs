// Per-unit lifecycle registry
//
// Processed state is keyed by stable id instead of living on the document
// node. The registry never owns node lifetime: entries for nodes that left
// the tree simply go cold.

use feedveil_core::{UnitId, UnitState};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
pub struct UnitRegistry {
  states: Mutex<HashMap<UnitId, UnitState>>,
}

impl UnitRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Admit a unit for classification: Unseen -> Pending, exactly once
  ///
  /// Synchronous on purpose - the caller claims the unit before any
  /// asynchronous work starts, which is what keeps overlapping scan passes
  /// from classifying the same unit twice. Returns false for units already
  /// pending or terminal.
  pub fn try_begin(&self, id: &UnitId) -> bool {
    let Ok(mut states) = self.states.lock() else {
      return false;
    };

    match states.get(id) {
      None | Some(UnitState::Unseen) => {
        states.insert(id.clone(), UnitState::Pending);
        true
      }
      Some(state) => {
        debug!("Unit {} already {}, skipping", id, state.as_str());
        false
      }
    }
  }

  /// Record the terminal verdict: Pending -> Matched/NotMatched
  pub fn complete(&self, id: &UnitId, matched: bool) {
    let Ok(mut states) = self.states.lock() else {
      return;
    };

    match states.get(id) {
      Some(UnitState::Pending) => {
        let terminal = if matched { UnitState::Matched } else { UnitState::NotMatched };
        states.insert(id.clone(), terminal);
      }
      other => debug!("Ignoring completion for unit {} in state {:?}", id, other),
    }
  }

  pub fn state(&self, id: &UnitId) -> UnitState {
    let Ok(states) = self.states.lock() else {
      return UnitState::Unseen;
    };

    states.get(id).copied().unwrap_or(UnitState::Unseen)
  }

  pub fn is_terminal(&self, id: &UnitId) -> bool {
    self.state(id).is_terminal()
  }

  /// Units that reached a terminal state
  pub fn processed_count(&self) -> usize {
    let Ok(states) = self.states.lock() else {
      return 0;
    };

    states.values().filter(|s| s.is_terminal()).count()
  }

  pub fn len(&self) -> usize {
    self.states.lock().map(|s| s.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
