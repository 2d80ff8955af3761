// Ordered, short-circuiting composition of classification strategies
//
// The first stage reporting a match decides the unit; cheap lexical stages
// therefore run before inference. A unit whose stages all miss (or error)
// is NoMatch. Final verdicts are memoized per unit content so a re-emitted
// unit costs one cache read.

use crate::stages::UnitClassifier;
use cache::Cache;
use feedveil_core::{MatchReason, Unit, UnitId, Verdict};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const MEMO_NAMESPACE: &str = "unit_results";

pub struct ClassifierPipeline {
  stages: Vec<Arc<dyn UnitClassifier>>,
  cache: Arc<Cache>,
  memo_ttl: Duration,
}

impl ClassifierPipeline {
  pub fn new(stages: Vec<Arc<dyn UnitClassifier>>, cache: Arc<Cache>, memo_ttl: Duration) -> Self {
    Self {
      stages,
      cache,
      memo_ttl,
    }
  }

  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.iter().map(|s| s.name()).collect()
  }

  /// Produce one verdict for the unit
  pub async fn classify(&self, unit: &Unit) -> Verdict {
    let memo_key = content_key(unit);

    if let Some(verdict) = self.cache.get::<Verdict>(MEMO_NAMESPACE, &memo_key) {
      debug!("Unit {} verdict from memo: {:?}", unit.id, verdict.reason);
      return verdict;
    }

    let mut saw_error = false;
    let mut verdict = Verdict::no_match();
    for stage in &self.stages {
      let stage_verdict = stage.classify(unit).await;
      debug!("Stage {} on unit {}: {:?}", stage.name(), unit.id, stage_verdict.reason);

      if stage_verdict.matched {
        verdict = stage_verdict;
        break;
      }
      if stage_verdict.reason == MatchReason::ClassifierError {
        saw_error = true;
      }
    }

    // A miss produced by a broken stage is not memoized; the next pass
    // over the same content deserves a working classifier
    if verdict.matched || !saw_error {
      self.cache.set(MEMO_NAMESPACE, &memo_key, &verdict, Some(self.memo_ttl));
    }

    verdict
  }
}

/// Memo key from the unit's content (not its marker id), so identical
/// content re-emitted under a new node reuses the verdict
fn content_key(unit: &Unit) -> String {
  UnitId::from_content(&unit.title, unit.thumbnail.as_ref().map(|t| t.as_str()))
    .as_str()
    .to_string()
}
