// Classification strategies composable into a pipeline
//
// Strategies never error: failures surface as ClassifierError verdicts so
// a broken strategy can only cost recall, never stall the pipeline.

use crate::text::TextClassifier;
use async_trait::async_trait;
use feedveil_core::{Unit, Verdict};
use keywords::{CachedKeywords, KeywordSource};
use std::sync::Arc;
use tracing::warn;
use vision::{ImageDetector, ThumbnailLoader};

/// One classification strategy
#[async_trait]
pub trait UnitClassifier: Send + Sync {
  fn name(&self) -> &str;

  async fn classify(&self, unit: &Unit) -> Verdict;
}

/// Keyword containment over the unit title
pub struct TitleKeywords<S> {
  keywords: Arc<CachedKeywords<S>>,
  text: TextClassifier,
}

impl<S: KeywordSource> TitleKeywords<S> {
  pub fn new(keywords: Arc<CachedKeywords<S>>) -> Self {
    Self {
      keywords,
      text: TextClassifier::new(),
    }
  }
}

#[async_trait]
impl<S: KeywordSource> UnitClassifier for TitleKeywords<S> {
  fn name(&self) -> &str {
    "title_keywords"
  }

  async fn classify(&self, unit: &Unit) -> Verdict {
    let set = self.keywords.get().await;
    if self.text.classify(&unit.title, &set) {
      Verdict::keyword()
    } else {
      Verdict::no_match()
    }
  }
}

/// Keyword containment over the thumbnail URL
///
/// Thumbnail file names often name their subject; checking them costs
/// nothing compared to inference.
pub struct ThumbnailUrlKeywords<S> {
  keywords: Arc<CachedKeywords<S>>,
  text: TextClassifier,
}

impl<S: KeywordSource> ThumbnailUrlKeywords<S> {
  pub fn new(keywords: Arc<CachedKeywords<S>>) -> Self {
    Self {
      keywords,
      text: TextClassifier::new(),
    }
  }
}

#[async_trait]
impl<S: KeywordSource> UnitClassifier for ThumbnailUrlKeywords<S> {
  fn name(&self) -> &str {
    "thumbnail_url_keywords"
  }

  async fn classify(&self, unit: &Unit) -> Verdict {
    let Some(reference) = &unit.thumbnail else {
      return Verdict::no_match();
    };

    let set = self.keywords.get().await;
    if self.text.classify(reference.as_str(), &set) {
      Verdict::keyword()
    } else {
      Verdict::no_match()
    }
  }
}

/// Model inference over the thumbnail image
pub struct ThumbnailModel<L> {
  loader: L,
  detector: ImageDetector,
}

impl<L: ThumbnailLoader> ThumbnailModel<L> {
  pub fn new(loader: L, detector: ImageDetector) -> Self {
    Self { loader, detector }
  }
}

#[async_trait]
impl<L: ThumbnailLoader> UnitClassifier for ThumbnailModel<L> {
  fn name(&self) -> &str {
    "thumbnail_model"
  }

  async fn classify(&self, unit: &Unit) -> Verdict {
    let Some(reference) = &unit.thumbnail else {
      return Verdict::no_match();
    };

    match self.loader.load(reference).await {
      Ok(image) => self.detector.detect(&image).await,
      Err(e) => {
        warn!("Thumbnail {} unavailable: {}", reference, e);
        Verdict::classifier_error()
      }
    }
  }
}
