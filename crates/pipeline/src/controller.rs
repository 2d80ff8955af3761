// Scan pass orchestration
//
// One pass: extract units from every changed subtree, claim each new unit
// synchronously (Unseen -> Pending) before any await, classify the claimed
// units concurrently, redact matches, record terminal states. Claiming
// before the first await is the at-most-once guarantee under overlapping
// passes.

use crate::mutation::MutationEvent;
use crate::redactor::Redactor;
use crate::registry::UnitRegistry;
use crate::watcher::ChangeWatcher;
use cache::Cache;
use classify::{ClassifierPipeline, ThumbnailModel, ThumbnailUrlKeywords, TitleKeywords, UnitClassifier};
use extract::UnitExtractor;
use feedveil_core::{Config, PipelineOrder, Unit, WatchConfig};
use keywords::{CachedKeywords, KeywordSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use vision::{CategoryRule, ImageClassifier, ImageDetector, ThumbnailLoader};

/// Assemble the classifier pipeline the way the config asks for it
pub fn build_classifier_pipeline<S, L>(
  config: &Config,
  keywords: Arc<CachedKeywords<S>>,
  loader: L,
  classifier: Arc<dyn ImageClassifier>,
  cache: Arc<Cache>,
) -> ClassifierPipeline
where
  S: KeywordSource + 'static,
  L: ThumbnailLoader + 'static,
{
  let detector = ImageDetector::new(
    classifier,
    CategoryRule::from_config(&config.vision),
    Arc::clone(&cache),
    Duration::from_secs(config.vision.memo_ttl_hours * 3600),
  );

  let title: Arc<dyn UnitClassifier> = Arc::new(TitleKeywords::new(Arc::clone(&keywords)));
  let model: Arc<dyn UnitClassifier> = Arc::new(ThumbnailModel::new(loader, detector));

  let mut lexical: Vec<Arc<dyn UnitClassifier>> = vec![title];
  if config.classify.check_thumbnail_urls {
    lexical.push(Arc::new(ThumbnailUrlKeywords::new(keywords)));
  }

  let stages = match config.classify.order {
    PipelineOrder::TextFirst => {
      let mut stages = lexical;
      stages.push(model);
      stages
    }
    PipelineOrder::ImageFirst => {
      let mut stages: Vec<Arc<dyn UnitClassifier>> = vec![model];
      stages.extend(lexical);
      stages
    }
  };

  ClassifierPipeline::new(
    stages,
    cache,
    Duration::from_secs(config.classify.memo_ttl_hours * 3600),
  )
}

/// Counters over the controller's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
  pub passes: u64,
  pub units_seen: u64,
  pub units_classified: u64,
  pub units_matched: u64,
}

/// Drives extraction, classification and redaction for scan passes
pub struct PipelineController {
  extractor: UnitExtractor,
  pipeline: Arc<ClassifierPipeline>,
  registry: Arc<UnitRegistry>,
  redactor: Arc<Redactor>,
  passes: AtomicU64,
  units_seen: AtomicU64,
  units_classified: AtomicU64,
  units_matched: AtomicU64,
}

impl PipelineController {
  pub fn new(
    extractor: UnitExtractor,
    pipeline: ClassifierPipeline,
    registry: Arc<UnitRegistry>,
    redactor: Arc<Redactor>,
  ) -> Self {
    Self {
      extractor,
      pipeline: Arc::new(pipeline),
      registry,
      redactor,
      passes: AtomicU64::new(0),
      units_seen: AtomicU64::new(0),
      units_classified: AtomicU64::new(0),
      units_matched: AtomicU64::new(0),
    }
  }

  pub fn registry(&self) -> &Arc<UnitRegistry> {
    &self.registry
  }

  pub fn redactor(&self) -> &Arc<Redactor> {
    &self.redactor
  }

  /// Run one scan pass over a batch of mutation events
  pub async fn scan(&self, events: Vec<MutationEvent>) {
    self.passes.fetch_add(1, Ordering::Relaxed);

    let mut admitted: Vec<Unit> = Vec::new();
    for event in &events {
      for subtree in &event.added {
        for unit in self.extractor.extract(subtree) {
          self.units_seen.fetch_add(1, Ordering::Relaxed);

          // Claimed synchronously, before any await in this pass
          if self.registry.try_begin(&unit.id) {
            admitted.push(unit);
          } else {
            trace!("Unit {} already claimed or processed", unit.id);
          }
        }
      }
    }

    if admitted.is_empty() {
      debug!("Scan pass admitted no new units");
      return;
    }

    debug!("Scan pass classifying {} units", admitted.len());
    let admitted_count = admitted.len() as u64;

    let work = admitted.into_iter().map(|unit| {
      let pipeline = Arc::clone(&self.pipeline);
      let registry = Arc::clone(&self.registry);
      let redactor = Arc::clone(&self.redactor);
      async move {
        // Once pending, the unit runs to completion; nothing cancels it
        let verdict = pipeline.classify(&unit).await;

        if verdict.matched {
          redactor.apply(&unit);
        }
        registry.complete(&unit.id, verdict.matched);

        verdict.matched
      }
    });

    let matched = futures::future::join_all(work).await.into_iter().filter(|m| *m).count();

    self.units_classified.fetch_add(admitted_count, Ordering::Relaxed);
    self.units_matched.fetch_add(matched as u64, Ordering::Relaxed);

    info!("Scan pass complete: {} matched", matched);
  }

  pub fn stats(&self) -> ScanStats {
    ScanStats {
      passes: self.passes.load(Ordering::Relaxed),
      units_seen: self.units_seen.load(Ordering::Relaxed),
      units_classified: self.units_classified.load(Ordering::Relaxed),
      units_matched: self.units_matched.load(Ordering::Relaxed),
    }
  }

  /// Wire the controller to a mutation channel as a background task
  pub fn spawn(self: Arc<Self>, rx: mpsc::Receiver<MutationEvent>, watch: &WatchConfig) -> JoinHandle<()> {
    let watcher = ChangeWatcher::new(rx, watch);

    tokio::spawn(async move {
      let controller = self;
      watcher
        .run(move |events| {
          let controller = Arc::clone(&controller);
          async move {
            controller.scan(events).await;
          }
        })
        .await;
      debug!("Mutation channel closed, controller task ending");
    })
  }
}
